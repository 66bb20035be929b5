pub mod profile;

pub use profile::{handle_get_profile, handle_update_profile};
