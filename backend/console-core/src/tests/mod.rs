mod config;
mod prefs;
mod proto;
mod store;
