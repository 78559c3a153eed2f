pub mod http_test_utils;
pub mod mock_event_store;
pub mod mock_mailer;
pub mod test_logging;
