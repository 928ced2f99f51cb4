pub mod helpers;

mod session;
