//! 図書館管理システムのクライアント
//!
//! REST API のポートとアダプタ、貸出・返却プロトコル、メッセージ、お気に入り、
//! セッションとルートガード、ページごとの状態コンテナを提供する。

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod pages;
pub mod ports;
pub mod telemetry;
