pub mod comment_feed;
pub mod station_detail;
pub mod station_list;
