use std::path::Path;

/// Поддерживаемые текстовые форматы файлов с цитатами.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// JSON: массив строк, объект с ключом `quotes`, массив объектов
    Json,
    /// CSV/TSV: первая колонка цитата, вторая (опционально) автор
    Csv,
    /// TOML: `quotes = [...]` или `[[quotes]]`
    Toml,
    /// Минимальное подмножество YAML: секвенции скаляров/маппингов
    Yaml,
    /// Плоский текст: одна цитата на строку
    Plain,
}

impl Format {
    /// Имя формата для логов.
    pub fn name(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Csv => "csv",
            Format::Toml => "toml",
            Format::Yaml => "yaml",
            Format::Plain => "plain",
        }
    }
}

/// Определяет формат файла в два шага:
/// 1) по расширению; 2) если расширения нет или оно незнакомо,
/// sniffing по содержимому в строгом порядке json -> csv -> toml -> yaml -> plain.
///
/// Знакомое расширение всегда важнее sniffing.
pub fn detect(path: &Path, content: &str) -> Format {
    match from_extension(path) {
        Some(f) => f,
        None => sniff(content),
    }
}

fn from_extension(path: &Path) -> Option<Format> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "json" => Some(Format::Json),
        "csv" => Some(Format::Csv),
        "toml" => Some(Format::Toml),
        "yaml" | "yml" => Some(Format::Yaml),
        "txt" => Some(Format::Plain),
        _ => None,
    }
}

fn sniff(content: &str) -> Format {
    if looks_like_json(content) {
        Format::Json
    } else if looks_like_csv(content) {
        Format::Csv
    } else if looks_like_toml(content) {
        Format::Toml
    } else if looks_like_yaml(content) {
        Format::Yaml
    } else {
        Format::Plain
    }
}

// первый непробельный байт { или [
fn looks_like_json(content: &str) -> bool {
    matches!(content.trim_start().as_bytes().first(), Some(&b'{') | Some(&b'['))
}

// первая непустая строка содержит запятую или таб
fn looks_like_csv(content: &str) -> bool {
    match first_nonempty_line(content) {
        Some(line) => line.contains(',') || line.contains('\t'),
        None => false,
    }
}

// хоть одна строка вне комментариев выглядит как [section] или `key = value`
fn looks_like_toml(content: &str) -> bool {
    content.lines().any(|raw| {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            return false;
        }
        (line.starts_with('[') && line.ends_with(']')) || line.contains(" = ")
    })
}

// документ начинается с ---, либо есть строка "- ..." или top-level "key:"
fn looks_like_yaml(content: &str) -> bool {
    if let Some(first) = first_nonempty_line(content) {
        if first.trim_end() == "---" || first.starts_with("--- ") {
            return true;
        }
    }
    content.lines().any(|raw| {
        let line = raw.trim_end();
        if line.starts_with("- ") || line == "-" {
            return true;
        }
        is_top_level_key(line)
    })
}

// "key:" без отступа: ключ непустой, без пробелов, после двоеточия пробел или конец
fn is_top_level_key(line: &str) -> bool {
    if line.starts_with(' ') || line.starts_with('\t') || line.starts_with('#') {
        return false;
    }
    match line.split_once(':') {
        Some((key, rest)) => {
            !key.is_empty()
                && !key.contains(char::is_whitespace)
                && (rest.is_empty() || rest.starts_with(' '))
        }
        None => false,
    }
}

fn first_nonempty_line(content: &str) -> Option<&str> {
    content.lines().find(|l| !l.trim().is_empty())
}
