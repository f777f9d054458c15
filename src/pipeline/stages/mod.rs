pub mod blanks;
pub mod columns;
pub mod dedupe;
pub mod email;
pub mod impute;
pub mod phone;
