use anyhow::{Context, Result};
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use projement::dashboard::{sort_for_dashboard, Pager};
use projement::db::Database;
use projement::models::hours::{format_hours, zero_hours};
use projement::models::{Company, LoggedHours, Project, ProjectReport, Tag, TagColor};

#[derive(Parser, Debug)]
#[command(name = "projement", version, about = "Track estimated and actual hours of company projects")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// The subcommand to run without a terminal UI, or `None` when the
    /// dashboard should open.
    pub fn batch_command(self) -> Option<Command> {
        self.command.filter(|command| !matches!(command, Command::Dashboard))
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open the interactive project dashboard (default)
    Dashboard,
    /// Apply pending database migrations
    Migrate,
    /// Print projects in dashboard order
    Projects {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
        /// Only print this 1-based page
        #[arg(long)]
        page: Option<usize>,
    },
    /// Manage tags
    #[command(subcommand)]
    Tag(TagCommand),
    /// Manage companies
    #[command(subcommand)]
    Company(CompanyCommand),
    /// Manage projects
    #[command(subcommand)]
    Project(ProjectCommand),
}

#[derive(Subcommand, Debug)]
pub enum TagCommand {
    Create {
        name: String,
        /// One of primary, secondary, success, danger, warning, info, light, dark
        color: TagColor,
    },
    List,
    Update {
        id: i32,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        color: Option<TagColor>,
    },
    Delete {
        id: i32,
    },
}

#[derive(Subcommand, Debug)]
pub enum CompanyCommand {
    Create {
        name: String,
        /// Tag id to attach; repeat for several
        #[arg(long = "tag")]
        tags: Vec<i32>,
    },
    List,
    Update {
        id: i32,
        #[arg(long)]
        name: Option<String>,
        /// Replace the tags with these ids
        #[arg(long = "tag")]
        tags: Vec<i32>,
        /// Remove every tag
        #[arg(long, conflicts_with = "tags")]
        clear_tags: bool,
    },
    /// Delete a company that has no projects
    Delete {
        id: i32,
    },
}

#[derive(Args, Debug)]
pub struct Estimates {
    #[arg(long)]
    pub estimated_design: i16,
    #[arg(long)]
    pub estimated_development: i16,
    #[arg(long)]
    pub estimated_testing: i16,
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    Create {
        #[arg(long)]
        company: i32,
        #[arg(long)]
        title: String,
        #[command(flatten)]
        estimates: Estimates,
        #[arg(long)]
        start_date: Option<NaiveDate>,
        #[arg(long)]
        end_date: Option<NaiveDate>,
    },
    Show {
        id: i32,
        #[arg(long)]
        json: bool,
    },
    Update {
        id: i32,
        #[arg(long)]
        company: Option<i32>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        start_date: Option<NaiveDate>,
        #[arg(long)]
        end_date: Option<NaiveDate>,
        #[arg(long)]
        clear_end_date: bool,
        #[arg(long)]
        estimated_design: Option<i16>,
        #[arg(long)]
        estimated_development: Option<i16>,
        #[arg(long)]
        estimated_testing: Option<i16>,
        #[arg(long)]
        actual_design: Option<BigDecimal>,
        #[arg(long)]
        actual_development: Option<BigDecimal>,
        #[arg(long)]
        actual_testing: Option<BigDecimal>,
    },
    Delete {
        id: i32,
    },
    /// Add worked hours to a project's actuals
    LogHours {
        id: i32,
        #[arg(long)]
        design: Option<BigDecimal>,
        #[arg(long)]
        development: Option<BigDecimal>,
        #[arg(long)]
        testing: Option<BigDecimal>,
    },
}

pub async fn run(command: Command, db: &Database, page_size: usize) -> Result<()> {
    match command {
        Command::Dashboard => unreachable!("batch_command never yields the dashboard"),
        Command::Migrate => {
            db.migrate().await?;
            println!("Migrations applied");
            Ok(())
        }
        Command::Projects { json, page } => list_projects(db, json, page, page_size).await,
        Command::Tag(command) => run_tag(command, db).await,
        Command::Company(command) => run_company(command, db).await,
        Command::Project(command) => run_project(command, db).await,
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

async fn list_projects(db: &Database, json: bool, page: Option<usize>, page_size: usize) -> Result<()> {
    let today = today();
    let mut projects = db.fetch_projects().await?;
    sort_for_dashboard(&mut projects, today);

    let mut pager = Pager::new(projects.len(), page_size);
    let shown = match page {
        Some(page) => {
            pager.go_to(page);
            pager.slice(&projects).to_vec()
        }
        None => projects,
    };
    let reports: Vec<ProjectReport> = shown.iter().map(|listed| listed.report(today)).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    println!(
        "{:>5}  {:<32} {:<20} {:<24} {:>9} {:>9}  {}",
        "ID", "PROJECT", "COMPANY", "TAGS", "ESTIMATED", "ACTUAL", "FLAGS"
    );
    for report in &reports {
        let mut flags = Vec::new();
        if report.has_ended {
            flags.push("ended");
        }
        if report.is_over_budget {
            flags.push("over budget");
        }
        println!(
            "{:>5}  {:<32} {:<20} {:<24} {:>9} {:>9}  {}",
            report.id,
            report.title,
            report.company,
            tag_names(&report.tags),
            report.total_estimated_hours,
            report.total_actual_hours,
            flags.join(", ")
        );
    }
    if page.is_some() {
        println!("Page {} of {}", pager.page, pager.total_pages());
    }

    Ok(())
}

async fn run_tag(command: TagCommand, db: &Database) -> Result<()> {
    match command {
        TagCommand::Create { name, color } => {
            let tag = db.create_tag(&Tag::new(name, color)).await?;
            println!("Created tag {} ({})", tag.id, tag);
        }
        TagCommand::List => {
            for tag in db.list_tags().await? {
                println!("{:>5}  {:<10} {}", tag.id, tag.color.label(), tag);
            }
        }
        TagCommand::Update { id, name, color } => {
            let mut tag = db.get_tag(id).await?;
            if let Some(name) = name {
                tag.name = name;
            }
            if let Some(color) = color {
                tag.color = color;
            }
            db.update_tag(&tag).await?;
            println!("Updated tag {}", id);
        }
        TagCommand::Delete { id } => {
            db.delete_tag(id).await?;
            println!("Deleted tag {}", id);
        }
    }
    Ok(())
}

async fn tags_by_id(db: &Database, ids: &[i32]) -> Result<Vec<Tag>> {
    let mut tags = Vec::with_capacity(ids.len());
    for &id in ids {
        tags.push(db.get_tag(id).await?);
    }
    Ok(tags)
}

async fn run_company(command: CompanyCommand, db: &Database) -> Result<()> {
    match command {
        CompanyCommand::Create { name, tags } => {
            let mut company = Company::new(name);
            company.tags = tags_by_id(db, &tags).await?;
            let company = db.create_company(&company).await?;
            println!("Created company {} ({})", company.id, company);
        }
        CompanyCommand::List => {
            for company in db.list_companies().await? {
                let tags: Vec<String> = company.tags.iter().map(|tag| tag.to_string()).collect();
                println!("{:>5}  {:<32} {}", company.id, company.name, tags.join(", "));
            }
        }
        CompanyCommand::Update { id, name, tags, clear_tags } => {
            let mut company = db.get_company(id).await?;
            if let Some(name) = name {
                company.name = name;
            }
            if clear_tags {
                company.tags.clear();
            } else if !tags.is_empty() {
                company.tags = tags_by_id(db, &tags).await?;
            }
            db.update_company(&company).await?;
            println!("Updated company {}", id);
        }
        CompanyCommand::Delete { id } => {
            db.delete_company(id).await?;
            println!("Deleted company {}", id);
        }
    }
    Ok(())
}

async fn run_project(command: ProjectCommand, db: &Database) -> Result<()> {
    match command {
        ProjectCommand::Create { company, title, estimates, start_date, end_date } => {
            let mut project = Project::new(
                company,
                title,
                estimates.estimated_design,
                estimates.estimated_development,
                estimates.estimated_testing,
            );
            project.start_date = start_date;
            project.end_date = end_date;
            let project = db.create_project(&project).await?;
            println!("Created project {} at {}", project.id, project.absolute_url());
        }
        ProjectCommand::Show { id, json } => {
            let report = db.fetch_project(id).await?.report(today());
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
        ProjectCommand::Update {
            id,
            company,
            title,
            start_date,
            end_date,
            clear_end_date,
            estimated_design,
            estimated_development,
            estimated_testing,
            actual_design,
            actual_development,
            actual_testing,
        } => {
            let mut project = db.get_project(id).await?;
            if let Some(company) = company {
                project.company_id = company;
            }
            if let Some(title) = title {
                project.title = title;
            }
            if start_date.is_some() {
                project.start_date = start_date;
            }
            if clear_end_date {
                project.end_date = None;
            } else if end_date.is_some() {
                project.end_date = end_date;
            }
            if let Some(hours) = estimated_design {
                project.estimated_design = hours;
            }
            if let Some(hours) = estimated_development {
                project.estimated_development = hours;
            }
            if let Some(hours) = estimated_testing {
                project.estimated_testing = hours;
            }
            if let Some(hours) = actual_design {
                project.actual_design = hours;
            }
            if let Some(hours) = actual_development {
                project.actual_development = hours;
            }
            if let Some(hours) = actual_testing {
                project.actual_testing = hours;
            }
            db.update_project(&project).await?;
            println!("Updated project {}", id);
        }
        ProjectCommand::Delete { id } => {
            db.delete_project(id).await?;
            println!("Deleted project {}", id);
        }
        ProjectCommand::LogHours { id, design, development, testing } => {
            let hours = LoggedHours {
                design: design.unwrap_or_else(zero_hours),
                development: development.unwrap_or_else(zero_hours),
                testing: testing.unwrap_or_else(zero_hours),
            };
            let project = db
                .log_hours(id, &hours)
                .await
                .with_context(|| format!("failed to log hours for project {}", id))?;
            println!(
                "Logged hours for {}: {} of {} estimated",
                project,
                format_hours(&project.total_actual_hours()),
                project.total_estimated_hours()
            );
        }
    }
    Ok(())
}

fn tag_names(tags: &[Tag]) -> String {
    tags.iter().map(|tag| tag.name.as_str()).collect::<Vec<_>>().join(", ")
}

fn print_report(report: &ProjectReport) {
    println!("{} ({})", report.title, report.url);
    println!("  Company:     {}", report.company);
    if !report.tags.is_empty() {
        println!("  Tags:        {}", tag_names(&report.tags));
    }
    let date = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string());
    println!("  Dates:       {} to {}", date(report.start_date), date(report.end_date));
    println!("  Design:      {:>5} estimated, {:>8} actual", report.estimated_design, report.actual_design);
    println!(
        "  Development: {:>5} estimated, {:>8} actual",
        report.estimated_development, report.actual_development
    );
    println!("  Testing:     {:>5} estimated, {:>8} actual", report.estimated_testing, report.actual_testing);
    println!(
        "  Total:       {:>5} estimated, {:>8} actual",
        report.total_estimated_hours, report.total_actual_hours
    );
    if report.is_over_budget {
        println!("  Over budget");
    }
    if report.has_ended {
        println!("  Ended");
    }
}
