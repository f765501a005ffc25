pub mod calendar_selector;
pub mod card_builder;
pub mod event_resolver;
pub mod notification_message_service;
pub mod provider;
pub mod schedule;
pub mod time_parse;
pub mod ufc_provider;
