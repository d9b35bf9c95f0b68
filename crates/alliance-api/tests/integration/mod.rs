mod admin;
mod public;
mod student;
