pub mod categorize;
pub mod dates;
pub mod materializer;

pub use categorize::{categorize_skill, SkillCategory};
pub use dates::{parse_flexible_date, years_of_experience};
pub use materializer::materialize;
