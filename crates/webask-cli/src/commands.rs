pub mod ask;
pub mod html;
pub mod version;
pub mod web;
