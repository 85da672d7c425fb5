//! Headless command-line driver for the dashboard core.

use pulse_dash::resource::FetchStatus;
use pulse_dash::updates::CheckOutcome;
use pulse_dash::Dashboard;
use pulse_proto::config::Config;

const USAGE: &str = "usage: tubepulse <command>

commands:
  status                 channel metrics + quota
  analyze                run a full analysis (quota-gated)
  check-updates          probe for new content; --accept to analyze on a hit
  videos [PAGE]          list one page of analysed videos
  video <ID>             details + comparison for one video of the page
  export                 download the latest analysis artifact";

pub async fn run(dashboard: &Dashboard, config: &Config, args: &[String]) -> anyhow::Result<()> {
    let command = args.first().map(String::as_str).unwrap_or("status");

    dashboard.bootstrap().await?;

    match command {
        "status" => {
            print_metrics(dashboard);
            println!(
                "analyses: {}/{} used{}",
                dashboard.quota.count(),
                dashboard.quota.count() + dashboard.quota.remaining(),
                match dashboard.quota.last_analysis() {
                    Some(at) => format!(", last at {}", at.to_rfc3339()),
                    None => String::new(),
                }
            );
        }
        "analyze" => {
            dashboard.run_full_analysis().await?;
            print_metrics(dashboard);
            println!("remaining analyses: {}", dashboard.quota.remaining());
        }
        "check-updates" => {
            let accept = args.iter().any(|a| a == "--accept");
            match dashboard.check_updates().await? {
                CheckOutcome::NoNewContent => println!("no new videos since the last analysis"),
                CheckOutcome::UpdatesOffered if accept => {
                    dashboard.accept_updates().await?;
                    println!("new content analysed; remaining: {}", dashboard.quota.remaining());
                }
                CheckOutcome::UpdatesOffered => {
                    dashboard.defer_updates();
                    println!("new videos found; re-run with --accept to analyse them");
                }
                CheckOutcome::Ignored => println!("a check is already in progress"),
            }
        }
        "videos" => {
            let page: u32 = args.get(1).and_then(|a| a.parse().ok()).unwrap_or(1);
            // First fetch teaches us the real page count; then navigate.
            dashboard.select_page(1).await?;
            if page > 1 {
                dashboard.select_page(page).await?;
            }
            let (page, total) = dashboard.selection.page_position();
            println!("page {page}/{total}");
            for video in dashboard.selection.videos() {
                let marker = if dashboard.selection.selected_id().as_deref()
                    == Some(video.video_id.as_str())
                {
                    "*"
                } else {
                    " "
                };
                println!(
                    "{marker} {}  {:>10} views  {:>8} likes  {:>8} comments  {}",
                    video.video_id, video.views, video.likes, video.comments, video.title
                );
            }
        }
        "video" => {
            let id = args
                .get(1)
                .ok_or_else(|| anyhow::anyhow!("video <ID> requires an id"))?;
            dashboard.select_page(1).await?;
            if !dashboard.select_video(id).await? {
                anyhow::bail!("video {id} is not on the current page");
            }
            if let FetchStatus::Ready(analytics) = dashboard.selection.analytics_status() {
                let s = analytics.sentiment;
                println!(
                    "sentiment: {} positive / {} neutral / {} negative",
                    s.positive, s.neutral, s.negative
                );
            }
            if let Some(cmp) = dashboard.engagement_comparison() {
                println!(
                    "views: {} ({:+}% vs channel average)",
                    cmp.views.current, cmp.views.delta_pct
                );
                println!(
                    "likes: {} ({:+}%), comments: {} ({:+}%)",
                    cmp.likes.current,
                    cmp.likes.delta_pct,
                    cmp.comments.current,
                    cmp.comments.delta_pct
                );
            }
            if let FetchStatus::Ready(comments) = dashboard.selection.comments_status() {
                println!("{} comments analysed", comments.len());
            }
        }
        "export" => {
            let artifact = dashboard.export_latest().await?;
            let out_dir = &config.export.output_dir;
            tokio::fs::create_dir_all(out_dir).await?;
            let path = out_dir.join(&artifact.filename);
            tokio::fs::write(&path, &artifact.bytes).await?;
            println!("exported to {}", path.display());
        }
        _ => {
            eprintln!("{USAGE}");
            anyhow::bail!("unknown command: {command}");
        }
    }

    Ok(())
}

fn print_metrics(dashboard: &Dashboard) {
    match dashboard.metrics_status() {
        FetchStatus::Ready(m) => {
            println!(
                "subscribers: {}  videos: {}  views: {}  likes: {}  comments: {}",
                m.subscribers, m.videos, m.views, m.likes, m.comments
            );
        }
        FetchStatus::Failed(e) => println!("metrics unavailable: {e}"),
        _ => println!("metrics not loaded"),
    }
}
