//! RSS 2.0 feed built from the blog post list.

use chrono::{Datelike, Utc};
use rss::{Category, Channel, ChannelBuilder, Guid, Item, ItemBuilder};

use crate::content::Post;

/// Build the RSS 2.0 channel for the blog.
///
/// One item per post, in the order given (callers pass the date-sorted list).
#[must_use]
pub fn build_channel(base_url: &str, posts: &[Post]) -> Channel {
    let items: Vec<Item> = posts.iter().map(|post| build_item(base_url, post)).collect();

    ChannelBuilder::default()
        .title("Fiftymillimeter Blog")
        .description("Photography stories and experiences from Ian Kennedy")
        .link(format!("{base_url}/blog"))
        .language("en".to_string())
        .copyright(format!(
            "All rights reserved {}, Ian Kennedy",
            Utc::now().year()
        ))
        .items(items)
        .build()
}

fn build_item(base_url: &str, post: &Post) -> Item {
    let link = format!("{base_url}{}", post.path);

    let pub_date = post
        .meta
        .date
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().to_rfc2822());

    let categories = post
        .meta
        .category
        .as_ref()
        .map(|name| {
            vec![Category {
                name: name.clone(),
                domain: None,
            }]
        })
        .unwrap_or_default();

    ItemBuilder::default()
        .title(post.meta.title.clone())
        .link(link.clone())
        .guid(Guid {
            value: link,
            permalink: true,
        })
        .description(post.meta.description.clone())
        .pub_date(pub_date)
        .categories(categories)
        .build()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::content::PostMeta;
    use chrono::NaiveDate;

    fn post(slug: &str, date: NaiveDate, category: Option<&str>) -> Post {
        Post {
            meta: PostMeta {
                title: format!("Title for {slug}"),
                date,
                description: format!("Description for {slug}"),
                image: None,
                category: category.map(ToString::to_string),
            },
            slug: slug.to_string(),
            path: format!("/blog/{slug}"),
            body: String::new(),
            html: None,
        }
    }

    #[test]
    fn channel_carries_one_item_per_post_in_order() {
        let posts = vec![
            post(
                "roadside-georgia",
                NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                Some("travel"),
            ),
            post(
                "winter-light",
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                None,
            ),
        ];

        let channel = build_channel("https://fiftymillimeter.com", &posts);

        assert_eq!(channel.items().len(), 2);
        assert_eq!(
            channel.items()[0].link(),
            Some("https://fiftymillimeter.com/blog/roadside-georgia")
        );
        assert_eq!(
            channel.items()[1].title(),
            Some("Title for winter-light")
        );
    }

    #[test]
    fn category_is_emitted_only_when_present() {
        let posts = vec![
            post(
                "with-category",
                NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                Some("travel"),
            ),
            post(
                "without-category",
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                None,
            ),
        ];

        let channel = build_channel("https://fiftymillimeter.com", &posts);

        assert_eq!(channel.items()[0].categories().len(), 1);
        assert_eq!(channel.items()[0].categories()[0].name(), "travel");
        assert!(channel.items()[1].categories().is_empty());
    }

    #[test]
    fn pub_date_is_rfc2822() {
        let posts = vec![post(
            "winter-light",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            None,
        )];

        let channel = build_channel("https://fiftymillimeter.com", &posts);
        let pub_date = channel.items()[0].pub_date().unwrap();
        assert!(pub_date.starts_with("Mon, 1 Jan 2024"));
    }

    #[test]
    fn serializes_to_rss_document() {
        let channel = build_channel("https://fiftymillimeter.com", &[]);
        let xml = channel.to_string();
        assert!(xml.contains("<rss"));
        assert!(xml.contains("Fiftymillimeter Blog"));
    }
}
