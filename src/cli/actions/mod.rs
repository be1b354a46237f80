pub mod server;

/// What the parsed command line asks the process to do.
#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        dsn: String,
        cache_capacity: usize,
        sessions_enabled: bool,
    },
}
