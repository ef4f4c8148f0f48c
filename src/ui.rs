pub mod stamp_dialog;
pub mod tree_view;
pub mod viewport;
