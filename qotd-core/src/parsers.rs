//! Парсеры пяти текстовых форматов с цитатами.
//!
//! Каждый парсер — чистая функция текст -> упорядоченный список
//! кандидатов (сырых строк). Кандидаты дальше проходят универсальную
//! нормализацию в [`crate::normalize`], здесь она не применяется.
//!
//! Терпимость к мусору: непригодные записи пропускаются молча,
//! синтаксическая ошибка JSON/TOML отдаётся наверх как [`ParseError`]
//! (файл будет пропущен с warning). CSV, YAML и plain не падают никогда.
//!
//! Правило автора: если запись несёт и цитату, и автора, они
//! склеиваются как `"{quote} — {author}"` (U+2014 с одиночными
//! пробелами по бокам).

use crate::error::ParseError;
use crate::format::Format;
use serde_json::Value as JsonValue;
use toml::Value as TomlValue;

/// Разбирает текст файла согласно определённому формату.
pub fn extract(format: Format, text: &str) -> Result<Vec<String>, ParseError> {
    match format {
        Format::Plain => Ok(parse_plain(text)),
        Format::Json => parse_json(text),
        Format::Csv => Ok(parse_csv(text)),
        Format::Toml => parse_toml(text),
        Format::Yaml => Ok(parse_yaml(text)),
    }
}

fn with_author(quote: &str, author: Option<&str>) -> String {
    match author.map(str::trim).filter(|a| !a.is_empty()) {
        Some(a) => format!("{quote} \u{2014} {a}"),
        None => quote.to_string(),
    }
}

// --- plain ---

// одна цитата на строку; CR по краям срезается вместе с пробелами
fn parse_plain(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|l| l.trim_matches(|c: char| c.is_ascii_whitespace()))
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

// --- json ---

// три формы: массив строк, объект {"quotes": [...]}, массив объектов
// с полями quote/text (+ author)
fn parse_json(text: &str) -> Result<Vec<String>, ParseError> {
    let root: JsonValue = serde_json::from_str(text)?;
    let mut out = Vec::new();
    match &root {
        JsonValue::Array(items) => collect_json_entries(items, &mut out),
        JsonValue::Object(map) => {
            if let Some(JsonValue::Array(items)) = map.get("quotes") {
                collect_json_entries(items, &mut out);
            }
        }
        _ => {}
    }
    Ok(out)
}

fn collect_json_entries(items: &[JsonValue], out: &mut Vec<String>) {
    for item in items {
        match item {
            JsonValue::String(s) => out.push(s.clone()),
            JsonValue::Object(map) => {
                let quote = map
                    .get("quote")
                    .and_then(JsonValue::as_str)
                    .or_else(|| map.get("text").and_then(JsonValue::as_str));
                if let Some(q) = quote {
                    if q.trim().is_empty() {
                        continue;
                    }
                    let author = map.get("author").and_then(JsonValue::as_str);
                    out.push(with_author(q, author));
                }
            }
            // не строка и не подходящий объект: пропускаем молча
            _ => {}
        }
    }
}

// --- csv ---

// первая колонка цитата, вторая (если есть) автор;
// разделитель выбирается по первой строке: ',' против '\t', при равенстве ','
fn parse_csv(text: &str) -> Vec<String> {
    let delim = detect_delimiter(text);
    let mut out = Vec::new();
    let mut first_row = true;

    for raw in text.split('\n') {
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_record(line, delim);
        if first_row {
            first_row = false;
            if is_header_cell(fields.first().map(String::as_str).unwrap_or("")) {
                continue;
            }
        }
        let quote = fields.first().map(String::as_str).unwrap_or("");
        if quote.trim().is_empty() {
            continue;
        }
        let author = fields.get(1).map(String::as_str);
        out.push(with_author(quote, author));
    }
    out
}

fn detect_delimiter(text: &str) -> char {
    let first = text
        .split('\n')
        .find(|l| !l.trim().is_empty())
        .unwrap_or("");
    let commas = first.matches(',').count();
    let tabs = first.matches('\t').count();
    if tabs > commas {
        '\t'
    } else {
        ','
    }
}

fn is_header_cell(cell: &str) -> bool {
    let c = cell.trim();
    ["quote", "text", "content", "quotes"]
        .iter()
        .any(|h| c.eq_ignore_ascii_case(h))
}

// минимальные правила кавычек: поле может быть в "...", литеральная
// кавычка внутри пишется ""
fn split_record(line: &str, delim: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
        } else if c == '"' && field.is_empty() {
            in_quotes = true;
        } else if c == delim {
            fields.push(std::mem::take(&mut field));
        } else {
            field.push(c);
        }
    }
    fields.push(field);
    fields
}

// --- toml ---

// две формы: quotes = ["...", ...] и [[quotes]] с quote/text (+ author);
// обе дают ключ "quotes" с массивом
fn parse_toml(text: &str) -> Result<Vec<String>, ParseError> {
    let table: toml::Table = text.parse()?;
    let mut out = Vec::new();
    if let Some(TomlValue::Array(items)) = table.get("quotes") {
        for item in items {
            match item {
                TomlValue::String(s) => out.push(s.clone()),
                TomlValue::Table(t) => {
                    let quote = t
                        .get("quote")
                        .and_then(TomlValue::as_str)
                        .or_else(|| t.get("text").and_then(TomlValue::as_str));
                    if let Some(q) = quote {
                        if q.trim().is_empty() {
                            continue;
                        }
                        let author = t.get("author").and_then(TomlValue::as_str);
                        out.push(with_author(q, author));
                    }
                }
                _ => {}
            }
        }
    }
    Ok(out)
}

// --- yaml ---

// минимальное подмножество: секвенция скаляров, секвенция маппингов
// quote/text (+ author), опциональный верхний ключ quotes:.
// Разделители --- документов, пустые строки и #-комментарии игнорируются.
fn parse_yaml(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur_quote: Option<String> = None;
    let mut cur_author: Option<String> = None;

    for raw in text.split('\n') {
        let trimmed = raw.trim_matches(|c: char| c.is_ascii_whitespace());
        if trimmed.is_empty()
            || trimmed.starts_with('#')
            || trimmed == "---"
            || trimmed.starts_with("--- ")
        {
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("- ") {
            flush_entry(&mut out, &mut cur_quote, &mut cur_author);
            let rest = rest.trim();
            match mapping_field(rest) {
                Some(("quote", v)) | Some(("text", v)) => {
                    cur_quote = Some(unquote(v).to_string());
                }
                Some(("author", v)) => cur_author = Some(unquote(v).to_string()),
                _ => {
                    let scalar = unquote(rest);
                    if !scalar.trim().is_empty() {
                        out.push(scalar.to_string());
                    }
                }
            }
        } else if trimmed == "-" {
            // пустой элемент секвенции
            flush_entry(&mut out, &mut cur_quote, &mut cur_author);
        } else if let Some((key, value)) = mapping_field(trimmed) {
            match key {
                "quotes" if value.is_empty() => {
                    flush_entry(&mut out, &mut cur_quote, &mut cur_author);
                }
                "quote" | "text" => cur_quote = Some(unquote(value).to_string()),
                "author" => cur_author = Some(unquote(value).to_string()),
                // незнакомый верхний ключ
                _ => {}
            }
        }
        // всё остальное игнорируем
    }

    flush_entry(&mut out, &mut cur_quote, &mut cur_author);
    out
}

fn flush_entry(out: &mut Vec<String>, quote: &mut Option<String>, author: &mut Option<String>) {
    let q = quote.take();
    let a = author.take();
    if let Some(q) = q {
        if !q.trim().is_empty() {
            out.push(with_author(&q, a.as_deref()));
        }
    }
}

// "key: value"; ключ без пробелов и кавычек, после ':' пробел или конец строки
fn mapping_field(s: &str) -> Option<(&str, &str)> {
    let (key, value) = s.split_once(':')?;
    let key = key.trim();
    if key.is_empty()
        || key.contains(char::is_whitespace)
        || key.contains('"')
        || key.contains('\'')
    {
        return None;
    }
    if !(value.is_empty() || value.starts_with(' ')) {
        return None;
    }
    Some((key, value.trim()))
}

fn unquote(s: &str) -> &str {
    let s = s.trim();
    let b = s.as_bytes();
    if s.len() >= 2
        && ((b[0] == b'"' && b[b.len() - 1] == b'"')
            || (b[0] == b'\'' && b[b.len() - 1] == b'\''))
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}
