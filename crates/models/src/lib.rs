//! SeaORM entities for the back-office plus the field validation and
//! business arithmetic that belongs to each entity.

pub mod errors;
pub mod db;
pub mod validate;
pub mod document;
pub mod category;
pub mod company;
pub mod tax;
pub mod product;
pub mod sale;
pub mod sale_item;
pub mod user;
pub mod user_credentials;

#[cfg(test)]
mod tests;
