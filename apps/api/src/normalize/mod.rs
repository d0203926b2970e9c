//! Text normalization for job titles and company names, shared by the
//! submission path and the offline `normalize` binary.

pub mod companies;
pub mod text;
pub mod titles;

pub use companies::normalize_company_name;
pub use text::{clean, slugify};
pub use titles::normalize_title;
