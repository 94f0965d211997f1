//! 허용 목록 문서 모델
//!
//! 파일을 라인 단위로 파싱하여 엔트리와 그 외 라인(빈 줄, 주석)을 순서대로 보존합니다.
//! 렌더링 시 엔트리가 아닌 라인은 원문 그대로 출력됩니다.

use std::fmt;
use std::net::IpAddr;

use crate::error::{AllowlistError, LineError};

/// 정규화된 CIDR 표기 (`<ip>/<prefix>`)
///
/// 중복 제거의 키로 사용됩니다. `203.0.113.7`과 `203.0.113.7/32`는 같은 값입니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cidr {
    addr: IpAddr,
    prefix: u8,
}

impl Cidr {
    /// 주소 문자열을 파싱합니다.
    ///
    /// 접두사 길이가 없는 IP는 단일 호스트(`/32`, `/128`)로 취급합니다.
    pub fn parse(input: &str) -> Result<Self, AllowlistError> {
        let input = input.trim();
        let invalid = || AllowlistError::InvalidAddress(input.to_owned());

        let (ip_part, prefix_part) = match input.split_once('/') {
            Some((ip, prefix)) => (ip, Some(prefix)),
            None => (input, None),
        };

        let addr: IpAddr = ip_part.parse().map_err(|_| invalid())?;
        let max_prefix = match addr {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        let prefix = match prefix_part {
            Some(p) => p.parse::<u8>().map_err(|_| invalid())?,
            None => max_prefix,
        };
        if prefix > max_prefix {
            return Err(invalid());
        }

        Ok(Self { addr, prefix })
    }

    /// IP 주소
    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    /// 접두사 길이
    pub fn prefix(&self) -> u8 {
        self.prefix
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix)
    }
}

/// 허용 목록 엔트리
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowlistEntry {
    /// 허용할 네트워크
    pub cidr: Cidr,
    /// 주석 (없으면 빈 문자열)
    pub comment: String,
}

impl AllowlistEntry {
    /// 새 엔트리를 생성합니다. 주석의 개행은 공백으로 바뀝니다.
    pub fn new(cidr: Cidr, comment: &str) -> Self {
        Self {
            cidr,
            comment: comment.replace(['\r', '\n'], " ").trim().to_owned(),
        }
    }
}

impl fmt::Display for AllowlistEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.comment.is_empty() {
            write!(f, "{}", self.cidr)
        } else {
            write!(f, "{} # {}", self.cidr, self.comment)
        }
    }
}

/// [`Allowlist::upsert`] 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// 새 엔트리 추가
    Inserted,
    /// 기존 엔트리의 주석 갱신
    Updated,
}

#[derive(Debug, Clone)]
enum Line {
    Entry(AllowlistEntry),
    Verbatim(String),
}

/// 파싱된 허용 목록 파일
#[derive(Debug, Clone, Default)]
pub struct Allowlist {
    lines: Vec<Line>,
}

impl Allowlist {
    /// 빈 목록을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 파일 내용을 파싱합니다.
    pub fn parse(content: &str) -> Result<Self, LineError> {
        let mut lines = Vec::new();

        for (idx, raw) in content.lines().enumerate() {
            let raw = raw.trim_end_matches('\r');
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                lines.push(Line::Verbatim(raw.to_owned()));
                continue;
            }

            let (cidr_part, comment) = match trimmed.split_once('#') {
                Some((cidr, comment)) => (cidr.trim(), comment.trim()),
                None => (trimmed, ""),
            };

            let cidr = Cidr::parse(cidr_part).map_err(|_| LineError {
                line: idx + 1,
                reason: format!("invalid CIDR '{cidr_part}'"),
            })?;

            lines.push(Line::Entry(AllowlistEntry::new(cidr, comment)));
        }

        Ok(Self { lines })
    }

    /// 엔트리를 추가하거나 같은 CIDR의 주석을 갱신합니다.
    ///
    /// 기존 파일에 같은 CIDR이 여러 번 있으면 첫 번째만 남기고 나머지는 제거합니다.
    pub fn upsert(&mut self, entry: AllowlistEntry) -> Upsert {
        let mut found = false;
        let mut replacement = Some(entry.clone());

        self.lines.retain_mut(|line| match line {
            Line::Entry(existing) if existing.cidr == entry.cidr => {
                if let Some(new_entry) = replacement.take() {
                    *existing = new_entry;
                    found = true;
                    true
                } else {
                    false
                }
            }
            _ => true,
        });

        if found {
            Upsert::Updated
        } else {
            self.lines.push(Line::Entry(entry));
            Upsert::Inserted
        }
    }

    /// CIDR로 엔트리를 찾습니다.
    pub fn get(&self, cidr: &Cidr) -> Option<&AllowlistEntry> {
        self.entries().find(|e| &e.cidr == cidr)
    }

    /// 엔트리를 파일 순서대로 반환합니다.
    pub fn entries(&self) -> impl Iterator<Item = &AllowlistEntry> {
        self.lines.iter().filter_map(|line| match line {
            Line::Entry(entry) => Some(entry),
            Line::Verbatim(_) => None,
        })
    }

    /// 엔트리 수
    pub fn len(&self) -> usize {
        self.entries().count()
    }

    /// 엔트리가 하나도 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 파일 내용으로 렌더링합니다. 각 라인은 `\n`으로 끝납니다.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                Line::Entry(entry) => out.push_str(&entry.to_string()),
                Line::Verbatim(raw) => out.push_str(raw),
            }
            out.push('\n');
        }
        out
    }
}
