//! The shadow-token engine: issuance lifecycle, risk assessment, and
//! redemption.

pub mod lifecycle;
pub mod oracle;
pub mod risk;
pub mod scan;
