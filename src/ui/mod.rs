pub mod session_view;
