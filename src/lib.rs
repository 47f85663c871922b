pub mod attachment;
pub mod config;
pub mod db;
pub mod form;
pub mod markdown;
pub mod middleware;
pub mod orm;
pub mod post;
pub mod reply;
pub mod s3;
pub mod session;
pub mod storage;
pub mod upload;
pub mod web;
