pub mod classroom;
pub mod invoice;
pub mod person;
pub mod product;
pub mod schedule;
pub mod subject;
pub mod teacher;
pub mod user;
