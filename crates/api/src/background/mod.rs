pub mod alert_detector;
