//! Универсальная нормализация цитат и content-addressed отпечатки.
//!
//! Применяется ко всем кандидатам после парсера, независимо от формата:
//! - байты файла декодируются как UTF-8 lossy (каждая битая
//!   последовательность становится U+FFFD);
//! - ASCII-пробелы по краям обрезаются;
//! - любой внутренний прогон пробельных символов (пробелы, табы,
//!   переводы строки) схлопывается в один пробел.
//!
//! Нормализация идемпотентна: повторный вызов ничего не меняет.

/// Нормализует пробелы в кандидате. Пустой результат означает,
/// что кандидата нужно отбросить.
pub fn normalize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for word in s.split_ascii_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// 32-байтный Blake3 отпечаток нормализованной цитаты.
/// Равенство отпечатков считается равенством содержимого.
pub fn fingerprint(content: &str) -> blake3::Hash {
    blake3::hash(content.as_bytes())
}
