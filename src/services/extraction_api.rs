//! Trait and types for turning report documents into tab-separated tables.

use anyhow::Result;

/// Which kind of document is being extracted; selects the instruction text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExtractionTask {
    /// Blasting work log (발파작업일지).
    BlastLog,
    /// Blast vibration and noise measurement log.
    VibrationLog,
    /// Free-text daily report pasted from a chat room; yields several tables.
    ChatReport,
    /// Any other document.
    Generic,
}

const BLAST_KEYWORDS: &[&str] = &["발파", "작업", "일지", "blast", "work", "log"];
const VIBRATION_KEYWORDS: &[&str] = &["계측", "진동", "소음", "measurement", "vibration", "noise"];

impl ExtractionTask {
    /// Picks a task from keywords in a file name. Vibration keywords win over
    /// blast keywords since measurement logs are usually titled "발파 진동".
    pub fn for_file_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        let has_any = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

        if has_any(VIBRATION_KEYWORDS) {
            ExtractionTask::VibrationLog
        } else if has_any(BLAST_KEYWORDS) {
            ExtractionTask::BlastLog
        } else {
            ExtractionTask::Generic
        }
    }

    pub fn instruction(self) -> &'static str {
        match self {
            ExtractionTask::BlastLog => BLAST_LOG_PROMPT,
            ExtractionTask::VibrationLog => VIBRATION_LOG_PROMPT,
            ExtractionTask::ChatReport => CHAT_REPORT_PROMPT,
            ExtractionTask::Generic => GENERIC_PROMPT,
        }
    }
}

const TSV_RULES: &str = "\
출력 규칙:
- 탭(\\t)으로 구분된 TSV 표만 출력하고 설명 문장은 쓰지 마세요.
- 첫 줄은 헤더입니다. 모든 행의 열 개수는 헤더와 같아야 합니다.
- 값이 없으면 빈 칸으로 두세요.
- 날짜는 YYYY-MM-DD, 시간은 HH:MM 형식으로 쓰세요.";

const BLAST_LOG_PROMPT: &str = "\
첨부한 발파작업일지에서 발파 기록을 표로 추출하세요.
헤더: 발파일자\t발파시간\t지발당최소장약량(kg)\t지발당최대장약량(kg)\t총장약량(kg)\t발파공수\t비고";

const VIBRATION_LOG_PROMPT: &str = "\
첨부한 발파 진동·소음 계측일지에서 측정 기록을 표로 추출하세요.
헤더: 측정일자\t측정시간\t측정위치\t진동(cm/sec)\t소음(dB(A))\t비고";

const CHAT_REPORT_PROMPT: &str = "\
다음 작업 보고 메시지를 읽고 아래 다섯 개의 표를 각각 코드 블록(```)으로 감싸서 순서대로 출력하세요.
1. 날씨: 구분\t오전\t오후
2. 공사현황: 구분\t누계\t금일
3. 작업내용: 구분\t금일작업\t명일작업
4. 인원: 공종\t전일\t금일\t누계
5. 장비: 장비명\t전일\t금일\t누계";

const GENERIC_PROMPT: &str = "다음 문서에서 가장 중요한 표를 찾아 추출하세요.";

/// The document handed to the extractor.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Text(String),
    /// Raw PDF bytes.
    Pdf(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRequest {
    pub task: ExtractionTask,
    pub document: Document,
}

impl ExtractionRequest {
    /// Full instruction text: the task template followed by the output rules.
    pub fn prompt(&self) -> String {
        format!("{}\n\n{}", self.task.instruction(), TSV_RULES)
    }
}

/// Abstraction over a document-to-table extraction provider.
#[async_trait::async_trait]
pub trait TableExtractor {
    /// Returns the provider's raw text answer; callers post-process it.
    async fn extract(&self, request: ExtractionRequest) -> Result<String>;
}
