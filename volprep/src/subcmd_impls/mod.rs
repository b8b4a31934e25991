pub mod args;
mod prepare;
mod recover;
mod utils;
mod verify;
mod window;

const MANIFEST: &str = "manifest.json";
