use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
pub struct Cli {
    /// Disk image file
    #[arg(long, short, global = true, default_value = "fs.img")]
    pub image: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a blank image and format it
    Format {
        #[command(flatten)]
        geometry: Geometry,
    },

    /// Format a new image and copy every regular file of a directory into it
    Pack {
        #[command(flatten)]
        geometry: Geometry,

        /// Host directory whose files are copied
        #[arg(long, short)]
        source: PathBuf,
    },

    /// List the root directory
    Ls,

    /// Print a file to stdout
    Cat {
        /// File name inside the image
        #[arg(long, short)]
        name: String,
    },

    /// Copy a host file into the image as a new file; existing names are refused
    Put {
        /// Host file to copy
        #[arg(long, short)]
        source: PathBuf,

        /// File name inside the image, defaults to the host file name
        #[arg(long, short)]
        name: Option<String>,
    },
}

#[derive(clap::Args)]
pub struct Geometry {
    /// Image size in sectors
    #[arg(long, default_value_t = 4096)]
    pub sectors: u64,

    /// Sectors per block
    #[arg(long, short, default_value_t = 1)]
    pub block_size: u32,
}
