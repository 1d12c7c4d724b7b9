pub mod aggregator;
pub mod alerts;
pub mod config;
pub mod delay;
pub mod error;
pub mod fetch;
pub mod model;
pub mod observe;
pub mod output;
pub mod parser;
pub mod summary;
pub mod vehicles;

pub mod gtfs_rt {
    include!(concat!(env!("OUT_DIR"), "/transit_realtime.rs"));
}
