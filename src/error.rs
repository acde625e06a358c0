use std::fmt;

use thiserror::Error;

/// ページ読み込み失敗の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadErrorKind {
    /// ナビゲーションまたはネットワークアイドル待機が上限時間を超えた
    Timeout,
    /// ナビゲーション自体が失敗した
    Navigation,
}

impl fmt::Display for LoadErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadErrorKind::Timeout => f.write_str("timeout"),
            LoadErrorKind::Navigation => f.write_str("navigation"),
        }
    }
}

#[derive(Error, Debug)]
#[error("{kind}: {message}")]
pub struct LoadError {
    pub kind: LoadErrorKind,
    pub message: String,
}

impl LoadError {
    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: LoadErrorKind::Timeout,
            message: message.into(),
        }
    }

    pub fn navigation(message: impl Into<String>) -> Self {
        Self {
            kind: LoadErrorKind::Navigation,
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("ブラウザ初期化エラー: {0}")]
    BrowserInit(String),

    #[error("ページ読み込みエラー: {0}")]
    Load(#[from] LoadError),

    #[error("ブラウザ操作エラー: {0}")]
    Automation(String),

    #[error("HTML解析エラー: {0}")]
    Parse(String),

    #[error("CSV出力エラー: {0}")]
    Export(#[from] csv::Error),

    #[error("ファイル操作エラー: {0}")]
    FileIO(#[from] std::io::Error),
}

impl ScraperError {
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            ScraperError::Load(LoadError {
                kind: LoadErrorKind::Timeout,
                ..
            })
        )
    }
}
