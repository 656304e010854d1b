pub mod document;
pub mod event;
pub mod view;
