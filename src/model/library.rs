use super::{Movie, Show};

/// Kind of content a library section holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Movie,
    Show,
}

/// A library section with its items
#[derive(Debug, Clone)]
pub struct LibrarySection {
    /// Section title as shown in Plex
    pub title: String,

    pub kind: SectionKind,

    /// Movies (empty for show sections)
    pub movies: Vec<Movie>,

    /// Shows (empty for movie sections)
    pub shows: Vec<Show>,
}

impl LibrarySection {
    /// Create an empty section
    pub fn new(title: impl Into<String>, kind: SectionKind) -> Self {
        Self {
            title: title.into(),
            kind,
            movies: Vec::new(),
            shows: Vec::new(),
        }
    }

    /// Number of items in this section
    pub fn len(&self) -> usize {
        match self.kind {
            SectionKind::Movie => self.movies.len(),
            SectionKind::Show => self.shows.len(),
        }
    }

    /// Check if section is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Complete media library: every exported section in server order
#[derive(Debug, Clone, Default)]
pub struct Library {
    sections: Vec<LibrarySection>,
}

impl Library {
    /// Create a new empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a section to the library
    pub fn add_section(&mut self, section: LibrarySection) {
        self.sections.push(section);
    }

    /// Get all sections
    pub fn sections(&self) -> &[LibrarySection] {
        &self.sections
    }

    /// Total number of movies across sections
    pub fn movie_count(&self) -> usize {
        self.sections.iter().map(|s| s.movies.len()).sum()
    }

    /// Total number of shows across sections
    pub fn show_count(&self) -> usize {
        self.sections.iter().map(|s| s.shows.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_creation() {
        let lib = Library::new();
        assert_eq!(lib.movie_count(), 0);
        assert_eq!(lib.show_count(), 0);
        assert!(lib.sections().is_empty());
    }

    #[test]
    fn test_add_sections() {
        let mut lib = Library::new();

        let mut movies = LibrarySection::new("Movies", SectionKind::Movie);
        movies.movies.push(Movie::new("Alien"));
        movies.movies.push(Movie::new("Aliens"));
        lib.add_section(movies);

        let mut shows = LibrarySection::new("TV Shows", SectionKind::Show);
        shows.shows.push(Show::new("The Wire"));
        lib.add_section(shows);

        assert_eq!(lib.movie_count(), 2);
        assert_eq!(lib.show_count(), 1);
        assert_eq!(lib.sections()[1].len(), 1);
        assert!(!lib.sections()[0].is_empty());
    }
}
