//! Interactive numbered menu
//!
//! The session owns the current store path; the store itself keeps no state.
//! Options 2-6 are refused until the current path names an existing file.
//! End of input ends the session like option 7.

use std::io::{BufRead, Write};

use crate::observability::{log_event, Event};
use crate::store::{FieldText, RecordFields, RecordStore, StoreErrorCode, StudentRecord};

use super::commands::student_id;
use super::config::Config;
use super::errors::CliResult;

const MENU: &str = "\nStudent Records Management System\n\
=================================\n\n\
1. Create Binary File\n\
2. Add Student Record\n\
3. Display All Records\n\
4. Search for a Record\n\
5. Update a Record\n\
6. Delete a Record\n\
7. Exit\n\
\nEnter your choice: ";

const SEPARATOR: &str = "-----------------------------";

/// Menu choices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    Create,
    Add,
    Display,
    Search,
    Update,
    Delete,
    Exit,
}

impl Choice {
    fn parse(line: &str) -> Option<Self> {
        match line.trim().parse::<u8>().ok()? {
            1 => Some(Choice::Create),
            2 => Some(Choice::Add),
            3 => Some(Choice::Display),
            4 => Some(Choice::Search),
            5 => Some(Choice::Update),
            6 => Some(Choice::Delete),
            7 => Some(Choice::Exit),
            _ => None,
        }
    }

    fn needs_store(&self) -> bool {
        !matches!(self, Choice::Create | Choice::Exit)
    }
}

/// An interactive session over any line-oriented input and output
pub struct MenuSession<R, W> {
    input: R,
    output: W,
    config: Config,
    current: Option<RecordStore>,
}

impl<R: BufRead, W: Write> MenuSession<R, W> {
    /// Start with the configured store path, if any
    pub fn new(input: R, output: W, config: Config) -> Self {
        let current = config
            .store_path
            .as_ref()
            .map(|path| RecordStore::with_options(path, config.store_options()));
        Self {
            input,
            output,
            config,
            current,
        }
    }

    /// Store the session currently works on
    pub fn current_store(&self) -> Option<&RecordStore> {
        self.current.as_ref()
    }

    /// Give back the output, mainly for inspecting a finished session
    pub fn into_output(self) -> W {
        self.output
    }

    /// Run until the user exits or input ends
    pub fn run(&mut self) -> CliResult<()> {
        log_event(Event::SessionStart);

        loop {
            write!(self.output, "{}", MENU)?;
            self.output.flush()?;

            let Some(line) = self.read_line()? else {
                break;
            };

            let Some(choice) = Choice::parse(&line) else {
                writeln!(self.output, "Invalid choice: please enter 1-7.")?;
                continue;
            };

            if choice.needs_store() && !self.has_store() {
                writeln!(
                    self.output,
                    "No binary file found.  Please create one first (option 1)."
                )?;
                continue;
            }

            let keep_going = match choice {
                Choice::Create => self.create()?,
                Choice::Add => self.add()?,
                Choice::Display => self.display()?,
                Choice::Search => self.search()?,
                Choice::Update => self.update()?,
                Choice::Delete => self.delete()?,
                Choice::Exit => {
                    writeln!(self.output, "\nExiting...")?;
                    writeln!(self.output, "Your session has ended.")?;
                    false
                }
            };

            if !keep_going {
                break;
            }
        }

        self.output.flush()?;
        log_event(Event::SessionEnd);
        Ok(())
    }

    fn has_store(&self) -> bool {
        self.current.as_ref().map(RecordStore::exists).unwrap_or(false)
    }

    fn store(&self) -> RecordStore {
        // Guarded by has_store() before every record operation
        self.current
            .clone()
            .unwrap_or_else(|| RecordStore::new(""))
    }

    /// Read one line without its line ending; `None` at end of input
    fn read_line(&mut self) -> CliResult<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(&['\n', '\r'][..]).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    fn prompt(&mut self, text: &str) -> CliResult<Option<String>> {
        write!(self.output, "{}", text)?;
        self.output.flush()?;
        self.read_line()
    }

    fn prompt_grade(&mut self, text: &str) -> CliResult<Option<f32>> {
        loop {
            let Some(line) = self.prompt(text)? else {
                return Ok(None);
            };
            match line.trim().parse::<f32>() {
                Ok(grade) => return Ok(Some(grade)),
                Err(_) => writeln!(self.output, "Invalid grade: please enter a number.")?,
            }
        }
    }

    /// Prompt for name, email, course and grade
    fn prompt_fields(&mut self, labels: [&str; 4]) -> CliResult<Option<RecordFields>> {
        let Some(name) = self.prompt(labels[0])? else {
            return Ok(None);
        };
        let Some(email) = self.prompt(labels[1])? else {
            return Ok(None);
        };
        let Some(course) = self.prompt(labels[2])? else {
            return Ok(None);
        };
        let Some(grade) = self.prompt_grade(labels[3])? else {
            return Ok(None);
        };
        Ok(Some(RecordFields::new(name, email, course, grade)))
    }

    fn prompt_id(&mut self, text: &str) -> CliResult<Option<FieldText>> {
        Ok(self.prompt(text)?.map(|line| student_id(&line)))
    }

    fn create(&mut self) -> CliResult<bool> {
        let Some(name) =
            self.prompt("\nWhat would you like to name the file? (w/ or w/o .bin) ")?
        else {
            return Ok(false);
        };
        let name = name.trim();
        if name.is_empty() {
            writeln!(self.output, "Error: Could not create file.")?;
            return Ok(true);
        }

        let store =
            RecordStore::with_options(self.config.with_extension(name), self.config.store_options());
        match store.initialize() {
            Ok(()) => {
                writeln!(
                    self.output,
                    "Binary file '{}' has been successfully created.",
                    store.path().display()
                )?;
                self.current = Some(store);
            }
            Err(_) => writeln!(self.output, "Error: Could not create file.")?,
        }
        Ok(true)
    }

    fn add(&mut self) -> CliResult<bool> {
        writeln!(self.output, "\nAdd Student Record")?;
        let store = self.store();

        let Some(id) = self.prompt_id("\nEnter student ID: ")? else {
            return Ok(false);
        };
        if id.is_empty() {
            writeln!(self.output, "\nError: Student ID must not be empty.")?;
            return Ok(true);
        }

        // Reject a taken id before asking for the other fields
        match store.find(&id) {
            Ok(_) => {
                writeln!(self.output, "\nError: Student ID {} already exists!", id)?;
                return Ok(true);
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => {
                writeln!(self.output, "Error: {}", e.message())?;
                return Ok(true);
            }
        }

        let Some(fields) = self.prompt_fields([
            "Enter student name: ",
            "Enter student email: ",
            "Enter student course: ",
            "Enter student grade(gpa): ",
        ])?
        else {
            return Ok(false);
        };

        match store.append(&StudentRecord::from_fields(id.clone(), fields)) {
            Ok(_) => writeln!(self.output, "\nStudent record added successfully.")?,
            Err(e) if e.code() == StoreErrorCode::DuplicateKey => {
                writeln!(self.output, "\nError: Student ID {} already exists!", id)?
            }
            Err(_) => writeln!(self.output, "Error: Could not open file for writing.")?,
        }
        Ok(true)
    }

    fn display(&mut self) -> CliResult<bool> {
        writeln!(self.output, "\nDisplay All Records")?;
        let store = self.store();

        writeln!(self.output, "\nStudent Records:")?;
        writeln!(self.output, "=================")?;

        let records = match store.list() {
            Ok(records) => records,
            Err(e) => {
                writeln!(self.output, "Error: {}", e.message())?;
                return Ok(true);
            }
        };

        let mut count = 0;
        for record in records {
            match record {
                Ok(record) => {
                    self.write_record(&record)?;
                    writeln!(self.output, "{}", SEPARATOR)?;
                    count += 1;
                }
                Err(e) => {
                    writeln!(self.output, "Error: {}", e.message())?;
                    break;
                }
            }
        }

        if count == 0 {
            writeln!(self.output, "No records found.")?;
        }
        Ok(true)
    }

    fn search(&mut self) -> CliResult<bool> {
        writeln!(self.output, "\nSearch for a Record")?;
        let store = self.store();

        let Some(id) = self.prompt_id("Enter the ID of the student to search: ")? else {
            return Ok(false);
        };

        match store.find(&id) {
            Ok(record) => self.write_record(&record)?,
            Err(e) if e.is_not_found() => writeln!(
                self.output,
                "No student record with ID {} exists. Please check and try again.",
                id
            )?,
            Err(e) => writeln!(self.output, "Error: {}", e.message())?,
        }
        Ok(true)
    }

    fn update(&mut self) -> CliResult<bool> {
        writeln!(self.output, "\nUpdate a Record")?;
        let store = self.store();

        let Some(id) = self.prompt_id("Enter the ID of the student to update: ")? else {
            return Ok(false);
        };

        match store.find(&id) {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                writeln!(self.output, "Record with ID {} not found.", id)?;
                return Ok(true);
            }
            Err(e) => {
                writeln!(self.output, "Error: {}", e.message())?;
                return Ok(true);
            }
        }

        let Some(fields) = self.prompt_fields([
            "Enter new name: ",
            "Enter new email: ",
            "Enter new course: ",
            "Enter new grade: ",
        ])?
        else {
            return Ok(false);
        };

        match store.update(&id, fields) {
            Ok(_) => writeln!(self.output, "Student record updated successfully.")?,
            Err(e) if e.is_not_found() => {
                writeln!(self.output, "Record with ID {} not found.", id)?
            }
            Err(_) => writeln!(self.output, "Error updating student record.")?,
        }
        Ok(true)
    }

    fn delete(&mut self) -> CliResult<bool> {
        writeln!(self.output, "\nDelete a Record")?;
        let store = self.store();

        let Some(id) = self.prompt_id("\nEnter the ID of the student to delete: ")? else {
            return Ok(false);
        };

        match store.delete(&id) {
            Ok(_) => writeln!(
                self.output,
                "\nStudent record with ID {} deleted successfully.",
                id
            )?,
            Err(e) if e.is_not_found() => {
                writeln!(self.output, "\nRecord with ID {} not found.", id)?
            }
            Err(e) if e.code() == StoreErrorCode::TempStorageUnavailable => {
                writeln!(self.output, "\nError: Could not create temporary file.")?
            }
            Err(_) => writeln!(self.output, "Error: Could not open file.")?,
        }
        Ok(true)
    }

    fn write_record(&mut self, record: &StudentRecord) -> CliResult<()> {
        writeln!(self.output, "ID: {}", record.id)?;
        writeln!(self.output, "Name: {}", record.name)?;
        writeln!(self.output, "Email: {}", record.email)?;
        writeln!(self.output, "Course: {}", record.course)?;
        writeln!(self.output, "Grade: {:.2}", record.grade)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn run_session(config: Config, script: &str) -> String {
        let mut session = MenuSession::new(Cursor::new(script.as_bytes().to_vec()), Vec::new(), config);
        session.run().unwrap();
        String::from_utf8(session.into_output()).unwrap()
    }

    #[test]
    fn test_choice_parse() {
        assert_eq!(Choice::parse("1"), Some(Choice::Create));
        assert_eq!(Choice::parse(" 7 "), Some(Choice::Exit));
        assert_eq!(Choice::parse("0"), None);
        assert_eq!(Choice::parse("8"), None);
        assert_eq!(Choice::parse("add"), None);
    }

    #[test]
    fn test_operations_refused_without_store() {
        let output = run_session(Config::default(), "3\n7\n");
        assert!(output.contains("No binary file found.  Please create one first (option 1)."));
        assert!(output.contains("Your session has ended."));
    }

    #[test]
    fn test_invalid_choice() {
        let output = run_session(Config::default(), "9\nabc\n7\n");
        assert_eq!(output.matches("Invalid choice: please enter 1-7.").count(), 2);
    }

    #[test]
    fn test_end_of_input_ends_session() {
        let output = run_session(Config::default(), "");
        assert!(output.contains("Enter your choice: "));
    }

    #[test]
    fn test_create_then_display_empty() {
        let temp_dir = TempDir::new().unwrap();
        let name = temp_dir.path().join("class");
        let script = format!("1\n{}\n3\n7\n", name.display());

        let output = run_session(Config::default(), &script);
        assert!(output.contains("has been successfully created."));
        assert!(output.contains("No records found."));
        assert!(temp_dir.path().join("class.bin").is_file());
    }

    #[test]
    fn test_bad_grade_is_reprompted() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("class.bin");
        RecordStore::new(&path).initialize().unwrap();
        let config = Config {
            store_path: Some(path.display().to_string()),
            sync_writes: false,
            ..Config::default()
        };

        let output = run_session(config, "2\nS1\nAlice\na@x.com\nCS1\nabc\n3.5\n7\n");
        assert!(output.contains("Invalid grade: please enter a number."));
        assert!(output.contains("Student record added successfully."));

        let record = RecordStore::new(&path).find("S1").unwrap();
        assert_eq!(record.grade, 3.5);
    }
}
