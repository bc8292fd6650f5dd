//! ServiceNow API CLI binary.
//!
//! A command-line interface for the ServiceNow table, attachment and sync APIs.

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use nowapi::cli::{AttachmentCommand, Cli, Command, OAuthCommand, SyncCommand, TableCommand, ViewArgs};
use nowapi::output::PrettyPrint;
use nowapi::{
    ApiResponse, Attachment, AttachmentApi, AttachmentListParams, AttachmentUploadParams,
    NowClient, NowError, OAuthClient, Record, SyncApi, TableApi, TableDeleteParams,
    TableGetParams, TableListParams, TableWriteParams, DEFAULT_TABLE_URL,
};
use serde::Serialize;
use tabled::{Table, Tabled};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            if matches!(e, NowError::ConfigMissing(_)) {
                eprintln!("Hint: Set NOW_INSTANCE_URL and NOW_USERNAME/NOW_PASSWORD (or NOW_CLIENT_ID, NOW_CLIENT_SECRET and NOW_ACCESS_TOKEN)");
            }
            ExitCode::FAILURE
        }
    }
}

fn authorize_url(client_id: &str, client_secret: &str) -> nowapi::Result<()> {
    let client = NowClient::with_default_base(DEFAULT_TABLE_URL)?;
    let oauth = client.oauth();
    oauth.set_client_details(OAuthClient::new(client_id, client_secret));
    println!("{}", oauth.authorize()?);
    Ok(())
}

async fn run(cli: Cli) -> nowapi::Result<()> {
    if let Command::Oauth(OAuthCommand::AuthorizeUrl {
        client_id,
        client_secret,
    }) = &cli.command
    {
        return authorize_url(client_id, client_secret);
    }

    let client = NowClient::from_env(DEFAULT_TABLE_URL)?;

    match cli.command {
        Command::Table(command) => handle_table(&client, command, cli.json).await,
        Command::Attachment(command) => handle_attachment(&client, command, cli.json).await,
        Command::Sync(command) => handle_sync(&client, command, cli.json).await,
        Command::Oauth(_) => Ok(()),
    }
}

async fn handle_table(client: &NowClient, command: TableCommand, json: bool) -> nowapi::Result<()> {
    let api = TableApi::from_client(client)?;

    match command {
        TableCommand::Get {
            table,
            sys_id,
            view,
        } => {
            let params = TableGetParams {
                sysparm_display_value: view.display_value.map(Into::into),
                sysparm_fields: view.fields,
                ..Default::default()
            };
            let record = api.get_record(&table, &sys_id, &params).await?;
            output_single(record, json)?;
        }
        TableCommand::List {
            table,
            query,
            limit,
            offset,
            view: ViewArgs {
                fields,
                display_value,
            },
        } => {
            let params = TableListParams {
                sysparm_display_value: display_value.map(Into::into),
                sysparm_fields: fields,
                sysparm_limit: Some(limit.unwrap_or(20)),
                sysparm_offset: offset,
                sysparm_query: query,
                ..Default::default()
            };
            let records = api.get_records(&table, &params).await?;
            output_list(records, json, |r| RecordRow::from(r))?;
        }
        TableCommand::Create { table, data } => {
            let record = api
                .post_record(&table, &data, &TableWriteParams::default())
                .await?;
            output_single(record, json)?;
        }
        TableCommand::Update {
            table,
            sys_id,
            data,
        } => {
            let record = api
                .patch_record(&table, &sys_id, &data, &TableWriteParams::default())
                .await?;
            output_single(record, json)?;
        }
        TableCommand::Replace {
            table,
            sys_id,
            data,
        } => {
            let record = api
                .put_record(&table, &sys_id, &data, &TableWriteParams::default())
                .await?;
            output_single(record, json)?;
        }
        TableCommand::Delete { table, sys_id } => {
            let response = api
                .delete_record(&table, &sys_id, &TableDeleteParams::default())
                .await?;
            let status = response.status;
            response.into_result()?;
            eprintln!("Deleted {table}/{sys_id} ({status})");
        }
    }
    Ok(())
}

async fn handle_attachment(
    client: &NowClient,
    command: AttachmentCommand,
    json: bool,
) -> nowapi::Result<()> {
    let api = AttachmentApi::from_client(client)?;

    match command {
        AttachmentCommand::Get { sys_id } => {
            output_single(api.get_record(&sys_id).await?, json)?;
        }
        AttachmentCommand::List {
            query,
            limit,
            offset,
        } => {
            let params = AttachmentListParams {
                sysparm_limit: Some(limit.unwrap_or(20)),
                sysparm_offset: offset,
                sysparm_query: query,
            };
            output_list(api.get_records(&params).await?, json, |a| {
                AttachmentRow::from(a)
            })?;
        }
        AttachmentCommand::Download { sys_id, output } => {
            let bytes = api.get_attachment(&sys_id).await?.into_result()?.unwrap_or_default();
            match output {
                Some(path) => {
                    std::fs::write(&path, &bytes)?;
                    eprintln!("Wrote {} bytes to {}", bytes.len(), path.display());
                }
                None => {
                    use std::io::Write;
                    std::io::stdout().write_all(&bytes)?;
                }
            }
        }
        AttachmentCommand::Upload {
            table,
            sys_id,
            file,
            file_name,
            content_type,
        } => {
            let data = std::fs::read(&file)?;
            let file_name = file_name.unwrap_or_else(|| default_file_name(&file));
            let attachment = api
                .post_attachment(
                    &table,
                    &sys_id,
                    &file_name,
                    &content_type,
                    data,
                    &AttachmentUploadParams::default(),
                )
                .await?;
            output_single(attachment, json)?;
        }
        AttachmentCommand::Delete { sys_id } => {
            let response = api.delete_record(&sys_id).await?;
            let status = response.status;
            response.into_result()?;
            eprintln!("Deleted attachment {sys_id} ({status})");
        }
    }
    Ok(())
}

async fn handle_sync(client: &NowClient, command: SyncCommand, json: bool) -> nowapi::Result<()> {
    let api = SyncApi::from_client(client)?;

    match command {
        SyncCommand::Config { app_id } => {
            let config = api.get_config(&app_id).await?.into_result()?;
            match config {
                Some(config) if json => println!("{}", serde_json::to_string_pretty(&config)?),
                Some(config) => {
                    println!("{}", config.data.pretty_print());
                    println!("Checksum:       {}", config.checksum);
                }
                None => eprintln!("No config for {app_id}"),
            }
        }
        SyncCommand::ConfigChecksum { app_id } => {
            output_single(api.get_config_checksum(&app_id).await?, json)?;
        }
        SyncCommand::DataChecksum { app_id } => {
            output_single(api.get_data_checksum(&app_id).await?, json)?;
        }
    }
    Ok(())
}

fn default_file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string())
}

fn output_single<T: Serialize + PrettyPrint>(
    response: ApiResponse<T>,
    json: bool,
) -> nowapi::Result<()> {
    let Some(item) = response.into_result()? else {
        eprintln!("No content");
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&item)?);
    } else {
        println!("{}", item.pretty_print());
    }
    Ok(())
}

fn output_list<T, R, F>(response: ApiResponse<Vec<T>>, json: bool, to_row: F) -> nowapi::Result<()>
where
    T: Serialize,
    R: Tabled,
    F: Fn(&T) -> R,
{
    let items = response.into_result()?.unwrap_or_default();

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        let rows: Vec<R> = items.iter().map(to_row).collect();
        println!("{}", Table::new(rows));
        println!("\n{} records", items.len());
    }
    Ok(())
}

// Table row types for non-JSON output

#[derive(Tabled)]
struct RecordRow {
    sys_id: String,
    number: String,
    description: String,
    updated: String,
}

impl From<&Record> for RecordRow {
    fn from(r: &Record) -> Self {
        Self {
            sys_id: r.sys_id.clone(),
            number: r.display_value("number").unwrap_or_default().to_string(),
            description: r
                .display_value("short_description")
                .or_else(|| r.display_value("name"))
                .unwrap_or_default()
                .to_string(),
            updated: r.value("sys_updated_on").unwrap_or_default().to_string(),
        }
    }
}

#[derive(Tabled)]
struct AttachmentRow {
    sys_id: String,
    file_name: String,
    table: String,
    size: String,
}

impl From<&Attachment> for AttachmentRow {
    fn from(a: &Attachment) -> Self {
        Self {
            sys_id: a.sys_id.clone(),
            file_name: a.file_name.clone(),
            table: format!("{}/{}", a.table_name, a.table_sys_id),
            size: a.size_bytes.map(|s| s.to_string()).unwrap_or_default(),
        }
    }
}
