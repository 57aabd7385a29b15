use std::io::{self, BufRead, Write};

use crate::{
    cli::presenter,
    console::{self, Tone},
    error::{FetchError, InputError},
    spotify::{Catalog, recommendations, search},
    types::{Fetched, Query, RecommendationConstraints, Resolution, ResolvedTrack},
    utils,
};

const NOT_FOUND: &str = "Song not found. Please check the track name and artist.";

/// Loop states after the session has been authorized.
#[derive(Debug)]
enum State {
    AwaitingQuery,
    Resolving(Query),
    Recommending(Query, ResolvedTrack),
    Presenting(Result<Fetched, FetchError>),
    Confirming,
    Exit,
}

/// The interactive query loop.
///
/// Reads operator input from `input`, writes every prompt and result to `out`
/// and talks to Spotify only through `catalog`. Apart from I/O failures on
/// the console itself nothing in here ends the loop except the operator
/// declining to continue or closing the input.
pub struct Session<'a, C, R, W> {
    catalog: &'a mut C,
    input: R,
    out: W,
    constraints: RecommendationConstraints,
    debug: bool,
    progress: bool,
}

impl<'a, C, R, W> Session<'a, C, R, W>
where
    C: Catalog,
    R: BufRead,
    W: Write,
{
    pub fn new(catalog: &'a mut C, input: R, out: W) -> Self {
        Session {
            catalog,
            input,
            out,
            constraints: RecommendationConstraints::default(),
            debug: false,
            progress: false,
        }
    }

    pub fn constraints(mut self, constraints: RecommendationConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Prints the resolved seeds and the request parameters before fetching.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Shows a spinner on stderr while recommendations are fetched.
    pub fn progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub async fn run(mut self) -> io::Result<()> {
        let mut state = State::AwaitingQuery;
        loop {
            state = match state {
                State::Exit => return Ok(()),
                State::AwaitingQuery => self.await_query()?,
                State::Resolving(query) => self.resolve(query).await?,
                State::Recommending(query, seed) => self.recommend(query, seed).await?,
                State::Presenting(result) => self.present(result)?,
                State::Confirming => self.confirm()?,
            };
        }
    }

    fn await_query(&mut self) -> io::Result<State> {
        let Some(title) = self.prompt_nonempty("\nEnter the song name: ")? else {
            return Ok(State::Exit);
        };
        let Some(artist) = self.prompt_nonempty("Enter the artist's name: ")? else {
            return Ok(State::Exit);
        };
        let Some(count) = self.prompt_count()? else {
            return Ok(State::Exit);
        };

        Ok(State::Resolving(Query {
            title,
            artist,
            count,
        }))
    }

    async fn resolve(&mut self, query: Query) -> io::Result<State> {
        writeln!(self.out, "\nFinding similar songs...")?;

        match search::resolve(&mut *self.catalog, &query.title, &query.artist).await {
            Ok(Resolution::Found(seed)) => Ok(State::Recommending(query, seed)),
            Ok(Resolution::NotFound) => {
                console::line(&mut self.out, Tone::Warning, format_args!("{}", NOT_FOUND))?;
                Ok(State::AwaitingQuery)
            }
            Err(e) => Ok(State::Presenting(Err(e))),
        }
    }

    async fn recommend(&mut self, query: Query, seed: ResolvedTrack) -> io::Result<State> {
        let request = recommendations::build_request(&seed, query.count, &self.constraints);

        if self.debug {
            let c = &request.constraints;
            writeln!(self.out, "\nDebug Information:")?;
            writeln!(self.out, "Track: {} - {}", seed.name, seed.artist_name)?;
            writeln!(self.out, "Track ID: {}", seed.track_id)?;
            writeln!(self.out, "Artist ID: {}", seed.artist_id)?;
            writeln!(self.out, "\nMaking recommendation request with parameters:")?;
            writeln!(self.out, "seed_tracks: {:?}", request.seed_tracks)?;
            writeln!(self.out, "seed_artists: {:?}", request.seed_artists)?;
            writeln!(self.out, "limit: {}", request.limit)?;
            writeln!(self.out, "market: {}", c.market.as_deref().unwrap_or("-"))?;
            writeln!(self.out, "min_popularity: {}", show(c.min_popularity))?;
            writeln!(self.out, "max_popularity: {}", show(c.max_popularity))?;
        }

        let pb = self
            .progress
            .then(|| utils::spinner("Fetching recommendations..."));
        let result = recommendations::fetch(&mut *self.catalog, &request).await;
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        Ok(State::Presenting(result))
    }

    fn present(&mut self, result: Result<Fetched, FetchError>) -> io::Result<State> {
        match result {
            Ok(Fetched::Tracks(tracks)) => {
                writeln!(self.out, "\nRecommended Songs:")?;
                writeln!(self.out, "{}", presenter::render(&tracks))?;
            }
            Ok(Fetched::Empty) => {
                console::line(
                    &mut self.out,
                    Tone::Info,
                    format_args!("{}", presenter::render(&[])),
                )?;
            }
            Err(e) => {
                console::line(&mut self.out, Tone::Error, format_args!("Error: {}", e))?;
            }
        }
        Ok(State::Confirming)
    }

    fn confirm(&mut self) -> io::Result<State> {
        match self.prompt("\nWould you like to search for another song? (y/n): ")? {
            Some(answer) if utils::is_affirmative(&answer) => Ok(State::AwaitingQuery),
            _ => Ok(State::Exit),
        }
    }

    /// Asks until a valid count arrives. `None` means the input is closed.
    fn prompt_count(&mut self) -> io::Result<Option<u8>> {
        loop {
            let Some(answer) = self.prompt("How many similar songs do you want (1-10)? ")? else {
                return Ok(None);
            };
            match utils::parse_count(&answer) {
                Ok(count) => return Ok(Some(count)),
                Err(e) => self.input_error(e)?,
            }
        }
    }

    fn prompt_nonempty(&mut self, text: &str) -> io::Result<Option<String>> {
        loop {
            match self.prompt(text)? {
                None => return Ok(None),
                Some(answer) if answer.is_empty() => self.input_error(InputError::Empty)?,
                Some(answer) => return Ok(Some(answer)),
            }
        }
    }

    fn prompt(&mut self, text: &str) -> io::Result<Option<String>> {
        write!(self.out, "{}", text)?;
        self.out.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.out)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn input_error(&mut self, err: InputError) -> io::Result<()> {
        console::line(&mut self.out, Tone::Warning, format_args!("{}", err))
    }
}

fn show(value: Option<u8>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}
