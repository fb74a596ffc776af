mod request;

pub use request::{
    PageFetcher, RequestFetcher, DESKTOP_USER_AGENT, FACEBOOK_USER_AGENT, IPHONE_USER_AGENT,
};
