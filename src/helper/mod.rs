pub mod dashboard_helpers;
pub mod document_access;
pub mod form_helpers;
pub mod news_form;
pub mod service_form;
pub mod view_helpers;
