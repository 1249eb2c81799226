pub mod charts;
pub mod figures;
pub mod format;
pub mod html;
