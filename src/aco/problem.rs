use std::{fs, num::ParseFloatError, path::Path, str::FromStr};

use anyhow::{anyhow, Result};
use regex::Regex;
use strum::EnumString;

use super::graph::Graph;

/// One input record: a labeled city position.
#[derive(Debug, Clone, PartialEq)]
pub struct City {
    pub label: String,
    pub x: f64,
    pub y: f64,
}

/// A TSP instance as loaded from disk (or built in), before it becomes a
/// fully connected [`Graph`].
#[derive(Debug)]
pub struct Dataset {
    pub name: String,
    pub cities: Vec<City>,
}

pub type NomResult<I, O> = nom::IResult<I, O, nom::error::VerboseError<I>>;

impl Dataset {
    /// Build the complete graph for this instance: one vertex per city,
    /// every unordered pair connected.
    pub fn into_graph(self) -> Graph {
        let mut graph = Graph::new();
        for city in self.cities {
            graph.add_vertex(city.label, city.x, city.y);
        }
        graph.connect_all();
        graph
    }

    fn parse(i: &str) -> NomResult<&str, Self> {
        // Local use statement so as not to clutter top of file, we need many
        use nom::{
            bytes::complete::{tag, take_while1},
            character::complete::{line_ending, multispace0, space0, space1},
            combinator::{map_parser, map_res, opt},
            error::ParseError,
            multi::count,
            sequence::{preceded, terminated, tuple},
            IResult,
        };

        /******************************/
        /*        Helper parsers      */
        /******************************/

        // Applies the inner parser, then consumes any number of spaces then a line ending
        fn trailing_ws<'a, F, O, E>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O, E>
        where
            F: FnMut(&'a str) -> IResult<&'a str, O, E> + 'a,
            E: ParseError<&'a str> + 'a,
        {
            terminated(inner, preceded(space0, line_ending))
        }

        // Single word value after "<key> :"
        fn word_after<'a, E>(key: &'a str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str, E>
        where
            E: ParseError<&'a str> + 'a,
        {
            preceded(
                terminated(tag(key), tag(" : ")),
                trailing_ws(take_while1(|c: char| {
                    c.is_ascii_alphanumeric() || c.is_ascii_punctuation()
                })),
            )
        }

        // Free-text value after "<key> :", up to the end of the line
        fn text_after<'a, E>(key: &'a str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str, E>
        where
            E: ParseError<&'a str> + 'a,
        {
            preceded(
                terminated(tag(key), tag(" : ")),
                trailing_ws(take_while1(|c: char| c != '\r' && c != '\n')),
            )
        }

        /******************************/
        /*       Actual Parsing       */
        /******************************/

        // Instance name
        let (i, name) = word_after("NAME")(i)?;

        // Optional comment about the instance, discarded
        let (i, _comment) = opt(text_after("COMMENT"))(i)?;

        // Type, must map to ProblemType
        let (i, _problem_type) = map_parser(word_after("TYPE"), ProblemType::parse)(i)?;

        // Dimension, mapped to usize
        let (i, dimension) = map_res(word_after("DIMENSION"), usize::from_str)(i)?;

        // Edge weight type, must map to EdgeWeightType
        let (i, _edge_weight_type) =
            map_parser(word_after("EDGE_WEIGHT_TYPE"), EdgeWeightType::parse)(i)?;

        // A signed decimal token
        fn numeric<'a, E>(i: &'a str) -> IResult<&'a str, &'a str, E>
        where
            E: ParseError<&'a str>,
        {
            take_while1(|c: char| c.is_ascii_digit() || c == '.' || c == '-')(i)
        }

        // One "<id> <x> <y>" line; the id token doubles as the label
        let coordinate = map_res(
            trailing_ws(tuple((
                preceded(space0, take_while1(|c: char| c.is_ascii_alphanumeric())),
                preceded(space1, numeric),
                preceded(space1, numeric),
            ))),
            |(id, x, y): (&str, &str, &str)| -> Result<_, ParseFloatError> {
                Ok(City {
                    label: id.to_string(),
                    x: x.parse::<f64>()?,
                    y: y.parse::<f64>()?,
                })
            },
        );

        // After the header, exactly <dimension> coordinate lines
        let (i, cities) = preceded(
            trailing_ws(tag("NODE_COORD_SECTION")),
            count(coordinate, dimension),
        )(i)?;

        // Optional EOF marker and trailing whitespace
        let (i, _) = opt(terminated(tag("EOF"), multispace0))(i)?;

        Ok((
            i,
            Self {
                name: name.to_string(),
                cities,
            },
        ))
    }

    /// Parse a TSPLIB-style EUC_2D instance.
    pub fn try_from_tsp(contents: &str) -> Result<Self> {
        use nom::combinator::complete;
        use nom::{
            Err::{Error, Failure},
            Offset,
        };

        match complete(Dataset::parse)(contents) {
            // Normal parse, return the dataset
            Ok((_, dataset)) => Ok(dataset),

            // Error handling must happen here, since the error type has a string slice
            // into contents, so if we returned that error directly, we would have a slice
            // into the dropped contents. We can only get Failures or Errors.
            Err(Failure(err) | Error(err)) => {
                let mut message = String::from("Parsing failed: ");
                for (error_slice, err) in err.errors {
                    let offset = contents.offset(error_slice);
                    message += &format!("{:?} at position {}: '{}'", err, offset, error_slice);
                }
                Err(anyhow!(message))
            }

            // Since wrapped in complete, Incomplete is transformed into Error
            _ => unreachable!(),
        }
    }

    pub fn try_from_tsp_file(path: &Path) -> Result<Self> {
        Self::try_from_tsp(&fs::read_to_string(path)?)
    }

    /// Parse the plain format: one "<label> <x> <y>" per line, blank
    /// lines skipped. The file stem (or "cities") names the instance.
    pub fn try_from_lines(name: impl Into<String>, contents: &str) -> Result<Self> {
        let regex = Regex::new(
            r"^\s*(?P<label>\S+)\s+(?P<x>-?[0-9]+(?:\.[0-9]+)?)\s+(?P<y>-?[0-9]+(?:\.[0-9]+)?)\s*$",
        )
        .expect("line pattern is valid");

        let mut cities = Vec::new();
        for line in contents.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let captures = regex
                .captures(line)
                .ok_or_else(|| anyhow!("Cannot match '{}'", line))?;

            cities.push(City {
                label: captures.name("label").map(|m| m.as_str().to_string()).unwrap_or_default(),
                x: captures.name("x").map_or("", |m| m.as_str()).parse::<f64>()?,
                y: captures.name("y").map_or("", |m| m.as_str()).parse::<f64>()?,
            });
        }

        if cities.is_empty() {
            return Err(anyhow!("No cities found in input"));
        }

        Ok(Self {
            name: name.into(),
            cities,
        })
    }

    pub fn try_from_lines_file(path: &Path) -> Result<Self> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("cities")
            .to_string();
        Self::try_from_lines(name, &fs::read_to_string(path)?)
    }

    /// The Oliver30 benchmark instance, used when no input file is given.
    pub fn oliver30() -> Self {
        const COORDINATES: [(f64, f64); 30] = [
            (54.0, 67.0),
            (54.0, 62.0),
            (37.0, 84.0),
            (41.0, 94.0),
            (2.0, 99.0),
            (7.0, 64.0),
            (25.0, 62.0),
            (22.0, 60.0),
            (18.0, 54.0),
            (4.0, 50.0),
            (13.0, 40.0),
            (18.0, 40.0),
            (24.0, 42.0),
            (25.0, 38.0),
            (44.0, 35.0),
            (41.0, 26.0),
            (45.0, 21.0),
            (58.0, 35.0),
            (62.0, 32.0),
            (82.0, 7.0),
            (91.0, 38.0),
            (83.0, 46.0),
            (71.0, 44.0),
            (64.0, 60.0),
            (68.0, 58.0),
            (83.0, 69.0),
            (87.0, 76.0),
            (74.0, 78.0),
            (71.0, 71.0),
            (58.0, 69.0),
        ];

        Self {
            name: "oliver30".to_string(),
            cities: COORDINATES
                .iter()
                .enumerate()
                .map(|(i, &(x, y))| City {
                    label: (i + 1).to_string(),
                    x,
                    y,
                })
                .collect(),
        }
    }
}

#[non_exhaustive]
#[derive(Debug, PartialEq, EnumString)]
enum ProblemType {
    #[strum(ascii_case_insensitive)]
    Tsp,
}

impl ProblemType {
    pub fn parse(i: &str) -> NomResult<&str, Self> {
        use nom::{bytes::complete::tag, combinator::map_res};
        map_res(tag("TSP"), ProblemType::from_str)(i)
    }
}

#[non_exhaustive]
#[derive(Debug, PartialEq, EnumString)]
enum EdgeWeightType {
    #[strum(serialize = "EUC_2D")]
    Euc2d,
}

impl EdgeWeightType {
    pub fn parse(i: &str) -> NomResult<&str, Self> {
        use nom::{bytes::complete::tag, combinator::map_res};
        map_res(tag("EUC_2D"), EdgeWeightType::from_str)(i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_TSP: &str = "NAME : square4\n\
        COMMENT : four corners of a unit square\n\
        TYPE : TSP\n\
        DIMENSION : 4\n\
        EDGE_WEIGHT_TYPE : EUC_2D\n\
        NODE_COORD_SECTION\n\
        1 0 0\n\
        2 0 1\n\
        3 1 1\n\
        4 1 0\n\
        EOF\n";

    #[test]
    fn parses_tsp_instance() {
        let dataset = Dataset::try_from_tsp(SAMPLE_TSP).unwrap();
        assert_eq!(dataset.name, "square4");
        assert_eq!(dataset.cities.len(), 4);
        assert_eq!(
            dataset.cities[1],
            City {
                label: "2".to_string(),
                x: 0.0,
                y: 1.0
            }
        );
    }

    #[test]
    fn parses_decimal_and_negative_coordinates() {
        let input = "NAME : tiny\n\
            TYPE : TSP\n\
            DIMENSION : 2\n\
            EDGE_WEIGHT_TYPE : EUC_2D\n\
            NODE_COORD_SECTION\n\
            1 -3.5 0.25\n\
            2 10 -2\n";
        let dataset = Dataset::try_from_tsp(input).unwrap();
        assert_eq!(dataset.cities[0].x, -3.5);
        assert_eq!(dataset.cities[0].y, 0.25);
        assert_eq!(dataset.cities[1].y, -2.0);
    }

    #[test]
    fn rejects_wrong_problem_type() {
        let input = "NAME : depot\n\
            TYPE : CVRP\n\
            DIMENSION : 1\n\
            EDGE_WEIGHT_TYPE : EUC_2D\n\
            NODE_COORD_SECTION\n\
            1 0 0\n";
        let result = Dataset::try_from_tsp(input);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_short_coordinate_section() {
        let input = "NAME : short\n\
            TYPE : TSP\n\
            DIMENSION : 3\n\
            EDGE_WEIGHT_TYPE : EUC_2D\n\
            NODE_COORD_SECTION\n\
            1 0 0\n\
            2 1 1\n";
        assert!(Dataset::try_from_tsp(input).is_err());
    }

    #[test]
    fn parses_plain_lines() {
        let input = "A 0 0\n\nB 10.5 20\nC -3 4\n";
        let dataset = Dataset::try_from_lines("test", input).unwrap();
        assert_eq!(dataset.cities.len(), 3);
        assert_eq!(dataset.cities[1].label, "B");
        assert_eq!(dataset.cities[1].x, 10.5);
        assert_eq!(dataset.cities[2].x, -3.0);
    }

    #[test]
    fn plain_lines_reject_garbage() {
        assert!(Dataset::try_from_lines("test", "A one two\n").is_err());
        assert!(Dataset::try_from_lines("test", "").is_err());
    }

    #[test]
    fn oliver30_becomes_a_complete_graph() {
        let graph = Dataset::oliver30().into_graph();
        assert_eq!(graph.total_vertices(), 30);
        assert_eq!(graph.total_edges(), 30 * 29 / 2);
    }
}
