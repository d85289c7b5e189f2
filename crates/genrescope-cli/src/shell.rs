use std::io::{BufRead, Write};
use std::thread::sleep;
use std::time::Duration;

use anyhow::Result;
use crossterm::style::Stylize;
use rand::Rng;

use genrescope_core::config::{AuthorConfig, ShellConfig};
use genrescope_core::storage::export::format_rating;
use genrescope_core::{CatalogSource, DataStore, FilmRecommendation, GenreIndex, GenreReport, GenrescopeError};

const RULE: &str = "______________________________________________________________";

/// Interactive genre prompt: list genres, read a choice, print its report,
/// repeat until `EXIT` or end of input.
pub struct Shell<'a, S, R, W> {
    store: &'a DataStore<S>,
    settings: &'a ShellConfig,
    author: &'a AuthorConfig,
    input: R,
    out: W,
}

impl<'a, S: CatalogSource, R: BufRead, W: Write> Shell<'a, S, R, W> {
    pub fn new(
        store: &'a DataStore<S>,
        settings: &'a ShellConfig,
        author: &'a AuthorConfig,
        input: R,
        out: W,
    ) -> Self {
        Self {
            store,
            settings,
            author,
            input,
            out,
        }
    }

    pub fn run<G: Rng + ?Sized>(&mut self, rng: &mut G) -> Result<()> {
        let store = self.store;
        let genres = store.list_genres()?;
        self.welcome()?;

        let mut genre = self.choose_genre(genres)?;
        while !GenreIndex::is_sentinel(&genre) {
            tracing::debug!(genre = %genre, "analyzing genre");
            match store.report(&genre, rng) {
                Ok(report) => self.print_report(&report)?,
                Err(e @ GenrescopeError::DivisionByZero { .. }) => {
                    writeln!(self.out, "\n{e}. Try another genre.")?;
                }
                Err(e) => return Err(e.into()),
            }
            genre = self.choose_genre(genres)?;
        }

        let bye = self.bold("\nThank you for using this program! Hope you did find it useful. See you next time!\n");
        self.typewrite(&bye)
    }

    fn welcome(&mut self) -> Result<()> {
        writeln!(self.out, "{RULE}")?;
        let bio = self.bold(&format!("\n{}\n", self.author.bio));
        self.typewrite(&bio)?;
        writeln!(self.out, "{RULE}")?;
        self.typewrite(&format!(
            "\nThis program will help you to analyze different genres, in which\n\
             {} wrote. It will also provide you with a list of\n\
             recommended ecranizations of their books to watch, and a list of\n\
             recommended books with no ecranization yet to read.\n",
            self.author.full_name
        ))
    }

    /// Show the genre list and read lines until one names a listed genre.
    /// End of input counts as `EXIT`.
    fn choose_genre(&mut self, genres: &GenreIndex) -> Result<String> {
        writeln!(self.out, "{RULE}")?;
        let heading = self.bold("\nAvailable genres:");
        self.typewrite(&heading)?;
        let lines: Vec<String> = genres
            .chunks(self.settings.genres_per_line)
            .map(|chunk| chunk.join(", "))
            .collect();
        writeln!(self.out, "{}", lines.join(",\n"))?;
        writeln!(self.out, "{RULE}")?;
        writeln!(self.out, "Choose a genre you want to analyze (or EXIT):")?;

        loop {
            self.out.flush()?;
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(genres.list().last().cloned().unwrap_or_default());
            }
            let choice = line.trim_end_matches(['\r', '\n']);
            if genres.contains(choice) {
                return Ok(choice.to_string());
            }
            writeln!(
                self.out,
                "There are no ecranizations of this genre of this author's books. Please, try again: "
            )?;
        }
    }

    fn print_report(&mut self, report: &GenreReport) -> Result<()> {
        let genre = &report.genre;
        let heading = self.bold(&format!("\n{genre:^62}"));
        self.typewrite(&heading)?;

        if !report.has_films() {
            writeln!(
                self.out,
                "\nThere are no films of {genre} genre that are ecranizations of {}'s books. \
                 You can choose another genre.",
                self.author.full_name
            )?;
            return Ok(());
        }

        let average = report
            .average_rating
            .map(format_rating)
            .unwrap_or_else(|| "unknown".to_string());
        writeln!(self.out, "\nThe average rating of films of {genre} genre is {average}.\n")?;

        let relative = report
            .relative_rating
            .map(format_rating)
            .unwrap_or_else(|| "0".to_string());
        writeln!(
            self.out,
            "The {genre} genre films are {relative}% more successful than films of other genres.\n"
        )?;

        writeln!(self.out, "Here is the list of {genre} genre films, formed specially for you.\n")?;
        writeln!(self.out, "{}", film_table(&report.films))?;

        if report.books.is_empty() {
            writeln!(
                self.out,
                "\nThere are no books of {genre} genre that were not ecranized. \
                 You may read ecranized books instead:"
            )?;
            for film in &report.films {
                writeln!(self.out, "{}", film.film)?;
            }
        } else {
            writeln!(self.out, "\nHere is the list of {genre} genre books, formed specially for you.\n")?;
            for book in &report.books {
                self.typewrite(book)?;
            }
        }

        writeln!(self.out, "{RULE}")?;
        writeln!(
            self.out,
            "If you want to analyze more genres, type the next genre; to finish the program, type EXIT."
        )?;
        Ok(())
    }

    fn bold(&self, text: &str) -> String {
        if self.settings.color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    /// Print `text` one character at a time, then a newline.
    fn typewrite(&mut self, text: &str) -> Result<()> {
        let delay = Duration::from_millis(self.settings.typing_delay_ms);
        if delay.is_zero() {
            writeln!(self.out, "{text}")?;
            return Ok(());
        }
        for ch in text.chars() {
            write!(self.out, "{ch}")?;
            self.out.flush()?;
            sleep(delay);
        }
        writeln!(self.out)?;
        Ok(())
    }
}

/// Right-aligned film column, like a printed data frame.
fn film_table(films: &[FilmRecommendation]) -> String {
    let rank_w = films.iter().map(|f| f.rank.to_string().len()).max().unwrap_or(1);
    let film_w = films.iter().map(|f| f.film.chars().count()).max().unwrap_or(0).max(4);

    let mut lines = vec![format!("{:rank_w$}  {:>film_w$}  rating", "", "film")];
    for f in films {
        lines.push(format!(
            "{:<rank_w$}  {:>film_w$}  {:>6}",
            f.rank,
            f.film,
            format_rating(f.rating)
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use genrescope_core::{FileCatalog, MergedRow, MergedTable};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::io::Cursor;

    fn store() -> DataStore<FileCatalog> {
        let table = MergedTable::new(vec![
            MergedRow::adapted("A", Some("Drama".into()), "A", "Drama", 8.0),
            MergedRow::unadapted("B", Some("Drama".into())),
            MergedRow::adapted("C", Some("Comedy".into()), "C", "Comedy", 6.0),
            MergedRow::unadapted("D", Some("Essay".into())),
        ]);
        DataStore::from_table(table, AuthorConfig::default(), 5)
    }

    fn quiet() -> ShellConfig {
        ShellConfig {
            typing_delay_ms: 0,
            genres_per_line: 2,
            color: false,
        }
    }

    fn run(input: &str) -> String {
        let store = store();
        let settings = quiet();
        let author = AuthorConfig::default();
        let mut out = Vec::new();
        let mut rng = StdRng::seed_from_u64(11);
        Shell::new(&store, &settings, &author, Cursor::new(input), &mut out)
            .run(&mut rng)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_shell_reports_genre_then_exits() {
        let out = run("Drama\nEXIT\n");
        assert!(out.contains("Available genres:"));
        assert!(out.contains("Comedy, Drama,\nEssay"));
        assert!(out.contains("The average rating of films of Drama genre is 8.0."));
        assert!(out.contains("are 33.33% more successful"));
        assert!(out.contains("1     A     8.0"));
        assert!(out.contains("formed specially for you.\n\nB\n"));
        assert!(out.contains("Thank you for using this program!"));
    }

    #[test]
    fn test_shell_rejects_unknown_genre() {
        let out = run("Horror\nEXIT\n");
        assert!(out.contains("Please, try again"));
        assert!(!out.contains("The average rating"));
    }

    #[test]
    fn test_shell_genre_without_films() {
        let out = run("Essay\nEXIT\n");
        assert!(out.contains("There are no films of Essay genre"));
    }

    #[test]
    fn test_shell_end_of_input_exits() {
        let out = run("");
        assert!(out.contains("Thank you for using this program!"));
    }

    #[test]
    fn test_film_table_alignment() {
        let table = film_table(&[
            FilmRecommendation {
                rank: 1,
                film: "A Room with a View".into(),
                rating: 8.6,
            },
            FilmRecommendation {
                rank: 2,
                film: "Egypt".into(),
                rating: 7.8,
            },
        ]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "                 film  rating");
        assert_eq!(lines[1], "1  A Room with a View     8.6");
        assert_eq!(lines[2], "2               Egypt     7.8");
    }
}
