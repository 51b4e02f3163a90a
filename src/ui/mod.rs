pub mod chat_view;
pub mod library_view;
pub mod toast;
