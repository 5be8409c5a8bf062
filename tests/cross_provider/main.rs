//! The same streaming scenarios run against every wire format the client speaks.

mod live;
mod providers;
mod streaming_e2e;
