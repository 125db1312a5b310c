pub mod dispatch {
    pub mod direction_decider;
    pub mod elevator;
    pub mod error;
    pub mod request_ledger;
}

pub mod service {
    pub mod client;
    pub mod error;
    pub mod protocol;
    pub mod server;
    pub mod sock;
}

pub mod util {
    pub mod config;
    pub mod constants;
}
