pub mod profile;
pub mod run;
pub mod trajectory;
pub mod ts;
pub mod util;
