//! Shared maud markup: the page shell, the error page and common styles.

use maud::{DOCTYPE, Markup, html};

use crate::currency::CurrencyCode;

// Link styles
pub const LINK_STYLE: &str = "text-blue-600 hover:text-blue-500 \
    dark:text-blue-500 dark:hover:text-blue-400 underline";

// Table styles
pub const TABLE_HEADER_STYLE: &str = "text-xs text-gray-700 uppercase \
    bg-gray-50 dark:bg-gray-700 dark:text-gray-400";

pub const TABLE_ROW_STYLE: &str = "bg-white border-b dark:bg-gray-800 dark:border-gray-700";

pub const TABLE_CELL_STYLE: &str = "px-6 py-4";

// Card style
pub const CARD_STYLE: &str = "rounded-lg bg-white dark:bg-gray-800 shadow p-4";

// Page container
pub const PAGE_CONTAINER_STYLE: &str =
    "flex flex-col items-center px-6 py-8 mx-auto lg:py-5 text-gray-900 dark:text-white";

/// Wrap `content` in the HTML document shell.
pub fn base(title: &str, content: &Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en"
        {
            head
            {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " - Budget Board" }
            }

            body class="container max-w-full min-h-screen bg-gray-50 dark:bg-gray-900"
            {
                (content)
            }
        }
    }
}

pub fn error_view(title: &str, header: &str, description: &str, fix: &str) -> Markup {
    let content = html!(
        section class="bg-white dark:bg-gray-900"
        {
            div class="py-8 px-4 mx-auto max-w-screen-xl lg:py-16 lg:px-6"
            {
                div class="mx-auto max-w-screen-sm text-center"
                {
                    h1
                        class="mb-4 text-7xl tracking-tight font-extrabold
                            lg:text-9xl text-blue-600 dark:text-blue-500"
                    {
                        (header)
                    }

                    p
                        class="mb-4 text-3xl md:text-4xl tracking-tight
                            font-bold text-gray-900 dark:text-white"
                    {
                        (description)
                    }

                    p
                        class="mb-4 text-1xl md:text-2xl tracking-tight
                            text-gray-900 dark:text-white"
                    {
                        (fix)
                    }

                    a
                        href="/"
                        class="inline-flex text-white bg-blue-600
                            hover:bg-blue-800 font-medium rounded text-sm px-5
                            py-2.5 text-center my-4"
                    {
                        "Back to Homepage"
                    }
                }
            }
        }
    );

    base(title, &content)
}

/// Links for switching the display currency, `link` gives the URL for each currency.
pub fn currency_picker(selected: CurrencyCode, link: impl Fn(CurrencyCode) -> String) -> Markup {
    html! {
        nav aria-label="Display currency" class="flex gap-3 text-sm"
        {
            @for code in CurrencyCode::ALL
            {
                @if code == selected
                {
                    span class="font-bold" aria-current="true" { (code.symbol()) " " (code) }
                }
                @else
                {
                    a href=(link(code)) class=(LINK_STYLE)
                    {
                        (code.symbol()) " " (code)
                    }
                }
            }
        }
    }
}

/// A short message shown when a table has no rows.
pub fn empty_message(text: &str) -> Markup {
    html! {
        p class="text-sm text-gray-500 dark:text-gray-400" { (text) }
    }
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};

    use crate::{
        currency::CurrencyCode,
        html::{currency_picker, error_view},
        test_utils::assert_valid_html,
    };

    #[test]
    fn error_view_is_valid_html() {
        let page = error_view("Oops", "500", "Broken", "Try later").into_string();

        let document = Html::parse_document(&page);

        assert_valid_html(&document);
        let title = Selector::parse("title").unwrap();
        assert_eq!(
            document.select(&title).next().unwrap().inner_html(),
            "Oops - Budget Board"
        );
    }

    #[test]
    fn currency_picker_links_every_other_currency() {
        let markup =
            currency_picker(CurrencyCode::GBP, |code| format!("/dashboard?currency={code}"))
                .into_string();

        let fragment = Html::parse_fragment(&markup);
        let links = Selector::parse("a").unwrap();
        let hrefs: Vec<&str> = fragment
            .select(&links)
            .filter_map(|link| link.value().attr("href"))
            .collect();

        assert_eq!(hrefs.len(), CurrencyCode::ALL.len() - 1);
        assert!(hrefs.contains(&"/dashboard?currency=USD"));
        assert!(!hrefs.contains(&"/dashboard?currency=GBP"));
    }
}
