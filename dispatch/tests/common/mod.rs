use std::io;

use dispatch::registry::Registry;

pub fn registry() -> Registry {
    Registry::initialize().unwrap()
}

pub fn capture(write: impl FnOnce(&mut dyn io::Write) -> io::Result<()>) -> String {
    let mut buffer = Vec::new();
    write(&mut buffer).unwrap();

    String::from_utf8(buffer).unwrap()
}
