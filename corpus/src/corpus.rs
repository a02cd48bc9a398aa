use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::CorpusError;
use crate::table;

/// Field separator used by the corpus and assignment files.
pub const SEP: char = ';';

/// Movie is one catalogue entry. Its identity is its ordinal position in
/// the [`Corpus`]; every derived artifact (vectors, cluster labels,
/// similarity matrix rows) is addressed by that position.
#[derive(Debug, Clone, PartialEq)]
pub struct Movie {
    pub title: String,
    pub synopsis: String,
    pub genres: Vec<String>,
    pub year: Option<u16>,
}

/// Corpus is the ordered collection of movies loaded from the backing
/// table. Row order in the file defines document indices 0..N-1 and is
/// stable for the lifetime of one loaded corpus.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    movies: Vec<Movie>,
}

impl Corpus {
    pub fn new(movies: Vec<Movie>) -> Self {
        Self { movies }
    }

    /// Load a corpus from a `;`-delimited file with a header row naming at
    /// least `title`, `synopsis` and `genres`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CorpusError> {
        let data = fs::read_to_string(path).map_err(|e| CorpusError::Io(e.to_string()))?;
        Self::parse(&data)
    }

    /// Parse corpus table data. See [`Corpus::load`].
    pub fn parse(data: &str) -> Result<Self, CorpusError> {
        let rows = table::parse(data, SEP)?;
        let mut iter = rows.into_iter();
        let header = iter
            .next()
            .ok_or_else(|| CorpusError::InvalidFormat("empty file".into()))?;

        let columns: HashMap<&str, usize> = header
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim(), i))
            .collect();

        let col = |names: &[&str]| -> Result<usize, CorpusError> {
            names
                .iter()
                .find_map(|n| columns.get(n).copied())
                .ok_or_else(|| CorpusError::MissingColumn(names[0].to_string()))
        };

        let title_col = col(&["title"])?;
        let synopsis_col = col(&["synopsis", "synopsis_content"])?;
        let genres_col = col(&["genres"])?;
        let year_col = columns.get("year").copied();

        let mut movies = Vec::new();
        for (line, row) in iter.enumerate() {
            let get = |c: usize| -> Result<&str, CorpusError> {
                row.get(c).map(|s| s.as_str()).ok_or_else(|| {
                    CorpusError::InvalidFormat(format!(
                        "row {} has {} fields, expected at least {}",
                        line + 2,
                        row.len(),
                        c + 1
                    ))
                })
            };

            let genres = get(genres_col)?
                .split(',')
                .map(|g| g.trim().to_string())
                .filter(|g| !g.is_empty())
                .collect();

            let year = match year_col {
                Some(c) => {
                    let raw = get(c)?.trim();
                    if raw.is_empty() {
                        None
                    } else {
                        Some(raw.parse::<u16>().map_err(|_| {
                            CorpusError::InvalidFormat(format!(
                                "row {}: invalid year '{raw}'",
                                line + 2
                            ))
                        })?)
                    }
                }
                None => None,
            };

            movies.push(Movie {
                title: get(title_col)?.trim().to_string(),
                synopsis: get(synopsis_col)?.to_string(),
                genres,
                year,
            });
        }

        Ok(Self { movies })
    }

    /// Exact title match. No fuzzy fallback.
    pub fn index_of_title(&self, title: &str) -> Option<usize> {
        self.movies.iter().position(|m| m.title == title)
    }

    pub fn get(&self, index: usize) -> Option<&Movie> {
        self.movies.get(index)
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Movie> {
        self.movies.iter()
    }

    /// Synopsis texts in corpus order, for batch embedding.
    pub fn synopses(&self) -> Vec<&str> {
        self.movies.iter().map(|m| m.synopsis.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
title;synopsis;genres;year
Solaris;an astronaut orbits a living ocean;Sci-Fi, Drama;1972
Heat;a thief and a detective circle each other;Crime,Thriller;1995
Amelie;\"a waitress; quietly, changes lives\";Comedy, Romance;2001
";

    #[test]
    fn test_parse_corpus() {
        let c = Corpus::parse(SAMPLE).unwrap();
        assert_eq!(c.len(), 3);
        assert_eq!(c.get(0).unwrap().title, "Solaris");
        assert_eq!(c.get(0).unwrap().genres, vec!["Sci-Fi", "Drama"]);
        assert_eq!(c.get(0).unwrap().year, Some(1972));
        assert_eq!(c.get(2).unwrap().synopsis, "a waitress; quietly, changes lives");
    }

    #[test]
    fn test_index_of_title_exact_only() {
        let c = Corpus::parse(SAMPLE).unwrap();
        assert_eq!(c.index_of_title("Heat"), Some(1));
        assert_eq!(c.index_of_title("heat"), None);
        assert_eq!(c.index_of_title("Hea"), None);
    }

    #[test]
    fn test_missing_column() {
        let err = Corpus::parse("title;genres\na;b\n").unwrap_err();
        assert!(matches!(err, CorpusError::MissingColumn(_)));
    }

    #[test]
    fn test_synopsis_content_alias() {
        let c = Corpus::parse("title;synopsis_content;genres\nX;plot;Drama\n").unwrap();
        assert_eq!(c.get(0).unwrap().synopsis, "plot");
    }

    #[test]
    fn test_ragged_row_rejected() {
        let err = Corpus::parse("title;synopsis;genres\nonly-title\n").unwrap_err();
        assert!(matches!(err, CorpusError::InvalidFormat(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(SAMPLE.as_bytes()).unwrap();
        let c = Corpus::load(f.path()).unwrap();
        assert_eq!(c.len(), 3);
        assert_eq!(c.synopses().len(), 3);
    }

    #[test]
    fn test_empty_file() {
        assert!(Corpus::parse("").is_err());
    }
}
