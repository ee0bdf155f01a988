pub mod bids;
pub mod gigs;
pub mod messages;
pub mod users;
