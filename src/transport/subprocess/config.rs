//! Configuration constants for the subprocess transport

/// Capacity of the buffer used for each read from a child pipe
pub const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Dangerous environment variables that should not be passed to subprocess
///
/// These variables can affect how the subprocess loads and executes code.
/// Values supplied through [`ClientOptions::env`](crate::ClientOptions::env)
/// under these names are dropped; the inherited environment is untouched.
pub const DANGEROUS_ENV_VARS: &[&str] = &[
    "LD_PRELOAD",
    "LD_LIBRARY_PATH",
    "DYLD_INSERT_LIBRARIES",
    "DYLD_LIBRARY_PATH",
    "PATH",
    "NODE_OPTIONS",
    "PYTHONPATH",
    "PERL5LIB",
    "RUBYLIB",
];

/// Environment variable advertising the client version to the server
pub const CLIENT_VERSION_ENV: &str = "KODEGEN_AUTOMATION_CLIENT_VERSION";
