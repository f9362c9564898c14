#![allow(dead_code)]

pub mod datastore;
pub mod downloader;
pub mod generator;
pub mod page_fetcher;
pub mod publisher;
pub mod transcriber;
pub mod video_processor;
