use std::fmt;

use console::style;

use crate::cache::CacheEntry;
use crate::result::{LookupResult, Pronunciation};

fn section_title(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(
        f,
        "========{txt:^width$}========",
        txt = style(title).magenta().dim(),
        width = 8
    )
}

/// 格式化查询结果
pub fn render_result(result: &LookupResult) -> String {
    ResultView(result).to_string()
}

/// 单词列表及查询次数
pub fn render_word_list(entries: &[CacheEntry]) -> String {
    WordListView(entries).to_string()
}

struct ResultView<'a>(&'a LookupResult);

impl fmt::Display for ResultView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.0;
        if !result.is_ok() {
            return writeln!(f, "{}", style(&result.error_code).red());
        }

        write!(f, "  {}", style(format!("[{}]", result.query)).bold().magenta())?;
        match &result.basic_pronunciation {
            Some(Pronunciation::Pair { uk, us }) => write!(
                f,
                "  {} {}  {} {}",
                style("英音:").blue(),
                style(format!("[{uk}]")).green(),
                style("美音:").blue(),
                style(format!("[{us}]")).green()
            )?,
            Some(Pronunciation::Single { phonetic }) => write!(
                f,
                "  {} {}",
                style("拼音:").blue(),
                style(format!("[{phonetic}]")).green()
            )?,
            None => {}
        }
        writeln!(f)?;

        if result.is_empty() {
            return writeln!(f, "  {}", style("没有找到释义").dim());
        }

        if !result.basic_explanations.is_empty() {
            section_title(f, "基本词典")?;
            for line in &result.basic_explanations {
                writeln!(f, "  {}", style(line).yellow())?;
            }
        }

        if !result.translations.is_empty() {
            section_title(f, "有道翻译")?;
            for line in &result.translations {
                writeln!(f, "  {}", style(line).cyan())?;
            }
        }

        if !result.web_phrases.is_empty() {
            section_title(f, "网络释义")?;
            for phrase in &result.web_phrases {
                writeln!(
                    f,
                    "  {}: {}",
                    style(&phrase.key).cyan(),
                    phrase.values.join("; ")
                )?;
            }
        }
        Ok(())
    }
}

struct WordListView<'a>(&'a [CacheEntry]);

impl fmt::Display for WordListView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.0;
        section_title(f, "单词列表")?;
        if entries.is_empty() {
            return writeln!(f, "  {}", style("(空)").dim());
        }
        let width = entries
            .iter()
            .map(|e| console::measure_text_width(&e.keyword))
            .max()
            .unwrap_or(0);
        for entry in entries {
            let pad = width - console::measure_text_width(&entry.keyword);
            writeln!(
                f,
                "  {}{}  {:>3}  {}",
                style(&entry.keyword).cyan(),
                " ".repeat(pad),
                style(entry.lookup_count).green(),
                style(entry.last_queried_at.format("%Y-%m-%d %H:%M")).dim()
            )?;
        }
        Ok(())
    }
}
