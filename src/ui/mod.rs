//! Terminal user interface

pub mod board_viewer;
