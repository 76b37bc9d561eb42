use clap::{Parser, Subcommand};

/// Command-line interface definition for kitplan
/// Schedules kitting jobs over work shifts, simulates what-if scenarios
/// and coordinates execution stations, on SQLite.
#[derive(Parser)]
#[command(
    name = "kitplan",
    version = env!("CARGO_PKG_VERSION"),
    about = "Kitting job scheduler: shift timelines, what-if scenarios and station coordination",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Show the configuration file
    Config {
        #[arg(long = "print", help = "Print the current configuration")]
        print_config: bool,
    },

    /// Manage work shifts
    Shift {
        #[command(subcommand)]
        action: ShiftAction,
    },

    /// Manage production jobs
    Job {
        #[command(subcommand)]
        action: JobAction,
    },

    /// Manage delays injected into job routes
    Delay {
        #[command(subcommand)]
        action: DelayAction,
    },

    /// Manage what-if scenarios
    Scenario {
        #[command(subcommand)]
        action: ScenarioAction,
    },

    /// Compute the timeline of a job (production, or inside a scenario)
    Schedule {
        /// Job id (synthetic negative ids address jobs ADDed in a scenario)
        #[arg(allow_hyphen_values = true)]
        job: Option<i64>,

        #[arg(long, help = "Compute the what-if timeline of this scenario")]
        scenario: Option<i64>,

        #[arg(long, help = "Compute every job")]
        all: bool,

        #[arg(long, help = "Show shift segments per item")]
        segments: bool,

        #[arg(long, help = "Print JSON instead of a table")]
        json: bool,
    },

    /// Coordinate execution stations
    Station {
        #[command(subcommand)]
        action: StationAction,
    },

    /// Print the internal audit log
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,
    },
}

#[derive(Subcommand)]
pub enum ShiftAction {
    /// Add a shift
    Add {
        name: String,

        #[arg(long = "start", help = "Start time (HH:MM)")]
        start: String,

        #[arg(long = "end", help = "End time (HH:MM), may be before start for overnight shifts")]
        end: String,

        #[arg(long = "break-start", help = "Break start (HH:MM)")]
        break_start: Option<String>,

        #[arg(long = "break", default_value_t = 0, help = "Break duration in minutes")]
        break_minutes: i64,

        #[arg(long, default_value_t = 0, help = "Selection order")]
        order: i32,

        #[arg(long, default_value = "")]
        color: String,

        #[arg(long, help = "Create the shift deactivated")]
        inactive: bool,
    },

    /// List shifts
    List,

    /// Activate or deactivate a shift
    Toggle {
        id: i64,

        #[arg(long, conflicts_with = "off")]
        on: bool,

        #[arg(long)]
        off: bool,
    },
}

#[derive(Subcommand)]
pub enum JobAction {
    /// Add a job with its route
    Add {
        name: String,

        #[arg(long = "start", help = "Planned start (YYYY-MM-DD HH:MM)")]
        start: String,

        #[arg(
            long = "step",
            help = "Route step as NAME=DURATION (e.g. pick=2h, pack=45m); repeat in order"
        )]
        steps: Vec<String>,

        #[arg(long = "shift", help = "Allowed shift id; repeat. Default: all active shifts")]
        shifts: Vec<i64>,

        #[arg(long, help = "Schedule on Saturdays and Sundays")]
        weekends: bool,

        #[arg(long, default_value_t = 1)]
        stations: i32,

        #[arg(long, default_value_t = 0)]
        kits: i32,
    },

    /// List jobs
    List,

    /// Delete a job and everything it owns
    Del { id: i64 },
}

#[derive(Subcommand)]
pub enum DelayAction {
    /// Insert a named delay after a step (0 = before the first step)
    Add {
        #[arg(allow_hyphen_values = true)]
        job: i64,

        name: String,

        #[arg(long, help = "Duration (e.g. 30m, 1h15m, or seconds)")]
        duration: String,

        #[arg(long, default_value_t = 0, help = "Step order the delay follows")]
        after: i32,

        #[arg(long, help = "Scope the delay to a scenario")]
        scenario: Option<i64>,
    },

    /// List delays of a job
    List {
        #[arg(allow_hyphen_values = true)]
        job: i64,

        #[arg(long)]
        scenario: Option<i64>,
    },
}

#[derive(Subcommand)]
pub enum ScenarioAction {
    /// Create an empty scenario
    Create { name: String },

    /// List scenarios with their changes
    List,

    /// Record an ADD change (JSON job fields, name and planned_start required)
    Add {
        scenario: i64,

        #[arg(long)]
        data: String,
    },

    /// Record a MODIFY change (JSON with the fields to overwrite)
    Modify {
        scenario: i64,

        #[arg(allow_hyphen_values = true)]
        job: i64,

        #[arg(long)]
        data: String,
    },

    /// Record a DELETE change
    Delete {
        scenario: i64,

        #[arg(allow_hyphen_values = true)]
        job: i64,
    },

    /// Flag a scenario as the one displayed
    Activate { id: i64 },

    /// Apply every change to production atomically
    Commit { id: i64 },

    /// Drop the scenario, its changes and delays
    Discard { id: i64 },
}

#[derive(Subcommand)]
pub enum StationAction {
    /// Open a station on a job and print its number
    Assign { job: i64 },

    /// Close a station
    Release { job: i64, station: u32 },

    /// Force every job's open-station counter to 0 (recovery)
    Reset,

    /// Record a completed kit
    Kit {
        job: i64,
        station: u32,

        #[arg(long, default_value = "")]
        name: String,
    },

    /// Show open stations and kit totals for a job
    Status { job: i64 },

    /// Poll the kit total of a job at the configured interval
    Watch {
        job: i64,

        #[arg(long, help = "Stop after this many polls")]
        polls: Option<u32>,

        #[arg(long, help = "Override the poll interval (seconds)")]
        interval: Option<u64>,
    },
}
