//! Server-rendered pages. Every interpolated value goes through [`escape`].

use natours_auth::User;
use natours_infra::html::{escape, escape_attribute};
use natours_infra::query::{ReviewView, TourView};

fn layout(title: &str, user: Option<&User>, content: &str) -> String {
    let nav = match user {
        Some(user) => format!(
            r#"<a class="nav__el nav__el--logout" href="/api/v1/users/logout">Log out</a><a class="nav__el" href="/me"><img class="nav__user-img" src="/img/users/{photo}" alt="Photo of {name}"><span>{first}</span></a>"#,
            photo = escape_attribute(&user.photo),
            name = escape(&user.name),
            first = escape(user.first_name()),
        ),
        None => r#"<a class="nav__el" href="/login">Log in</a>"#.to_string(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Natours | {title}</title>
</head>
<body>
<header class="header"><nav class="nav nav--tours"><a class="nav__el" href="/">All tours</a></nav><nav class="nav nav--user">{nav}</nav></header>
<main class="main">
{content}
</main>
<footer class="footer"><p class="footer__copyright">&copy; Natours</p></footer>
</body>
</html>
"#,
        title = escape(title),
    )
}

fn tour_card(view: &TourView) -> String {
    let tour = &view.tour;
    let start = tour
        .start_dates
        .first()
        .map(|d| d.format("%B %Y").to_string())
        .unwrap_or_default();
    let location = tour
        .start_location
        .as_ref()
        .and_then(|l| l.description.as_deref())
        .unwrap_or_default();

    format!(
        r#"<div class="card">
<div class="card__header"><img class="card__picture-img" src="/img/tours/{cover}" alt="{name}"><h3 class="heading-tertirary"><span>{name}</span></h3></div>
<div class="card__details">
<h4 class="card__sub-heading">{difficulty} {duration}-day tour</h4>
<p class="card__text">{summary}</p>
<div class="card__data"><span>{location}</span></div>
<div class="card__data"><span>{start}</span></div>
<div class="card__data"><span>{stops} stops</span></div>
<div class="card__data"><span>{group} people</span></div>
</div>
<div class="card__footer">
<p><span class="card__footer-value">${price}</span> <span class="card__footer-text">per person</span></p>
<p class="card__ratings"><span class="card__footer-value">{rating}</span> <span class="card__footer-text">rating ({quantity})</span></p>
<a class="btn btn--green btn--small" href="/tour/{slug}">Details</a>
</div>
</div>"#,
        cover = escape_attribute(&tour.image_cover),
        name = escape(&tour.name),
        difficulty = escape(tour.difficulty.as_str()),
        duration = tour.duration,
        summary = escape(tour.summary.as_deref().unwrap_or_default()),
        location = escape(location),
        start = escape(&start),
        stops = tour.locations.len(),
        group = tour.max_group_size,
        price = tour.price,
        rating = tour.ratings_average,
        quantity = tour.ratings_quantity,
        slug = escape_attribute(&tour.slug),
    )
}

pub fn overview(title: &str, tours: &[TourView], user: Option<&User>) -> String {
    let cards: String = tours.iter().map(tour_card).collect();
    layout(title, user, &format!(r#"<div class="card-container">{cards}</div>"#))
}

fn review_card(review: &ReviewView) -> String {
    let author = review
        .user
        .as_ref()
        .map(|a| escape(&a.name))
        .unwrap_or_default();
    format!(
        r#"<div class="reviews__card"><h6 class="reviews__user">{author}</h6><p class="reviews__text">{text}</p><p class="reviews__rating">{rating} / 5</p></div>"#,
        text = escape(&review.review),
        rating = review.rating,
    )
}

pub fn tour_detail(view: &TourView, user: Option<&User>) -> String {
    let tour = &view.tour;
    let guides: String = view
        .guides
        .iter()
        .map(|g| {
            format!(
                r#"<div class="overview-box__detail"><img class="overview-box__img" src="/img/users/{photo}" alt="{name}"><span class="overview-box__label">{role}</span><span class="overview-box__text">{name}</span></div>"#,
                photo = escape_attribute(&g.photo),
                name = escape(&g.name),
                role = escape(g.role.as_str()),
            )
        })
        .collect();
    let paragraphs: String = tour
        .description
        .split('\n')
        .filter(|p| !p.trim().is_empty())
        .map(|p| format!(r#"<p class="description__text">{}</p>"#, escape(p)))
        .collect();
    let reviews: String = view.reviews.iter().flatten().map(review_card).collect();

    let content = format!(
        r#"<section class="section-header"><h1 class="heading-primary"><span>{name} tour</span></h1><div class="heading-box__group"><span class="heading-box__text">{duration} days</span></div></section>
<section class="section-description">
<div class="overview-box"><h2 class="heading-secondary">Quick facts</h2>
<div class="overview-box__detail"><span class="overview-box__label">Difficulty</span><span class="overview-box__text">{difficulty}</span></div>
<div class="overview-box__detail"><span class="overview-box__label">Participants</span><span class="overview-box__text">{group} people</span></div>
<div class="overview-box__detail"><span class="overview-box__label">Rating</span><span class="overview-box__text">{rating} / 5</span></div>
<h2 class="heading-secondary">Your tour guides</h2>{guides}
</div>
<div class="description-box"><h2 class="heading-secondary">About {name} tour</h2>{paragraphs}</div>
</section>
<section class="section-reviews"><div class="reviews">{reviews}</div></section>"#,
        name = escape(&tour.name),
        duration = tour.duration,
        difficulty = escape(tour.difficulty.as_str()),
        group = tour.max_group_size,
        rating = tour.ratings_average,
    );

    layout(&format!("{} Tour", tour.name), user, &content)
}

pub fn login(user: Option<&User>) -> String {
    let content = r#"<div class="login-form"><h2 class="heading-secondary">Log into your account</h2>
<form class="form form--login">
<div class="form__group"><label class="form__label" for="email">Email address</label><input class="form__input" id="email" type="email" placeholder="you@example.com" required></div>
<div class="form__group"><label class="form__label" for="password">Password</label><input class="form__input" id="password" type="password" placeholder="••••••••" required minlength="8"></div>
<div class="form__group"><button class="btn btn--green">Login</button></div>
</form></div>"#;
    layout("Log into your account", user, content)
}

pub fn account(user: &User) -> String {
    let content = format!(
        r#"<div class="user-view"><div class="user-view__content"><div class="user-view__form-container">
<h2 class="heading-secondary">Your account settings</h2>
<form class="form form-user-data">
<div class="form__group"><label class="form__label" for="name">Name</label><input class="form__input" id="name" type="text" value="{name}" required></div>
<div class="form__group"><label class="form__label" for="email">Email address</label><input class="form__input" id="email" type="email" value="{email}" required></div>
<div class="form__group form__photo-upload"><img class="form__user-photo" src="/img/users/{photo}" alt="User photo"></div>
</form>
</div></div></div>"#,
        name = escape(&user.name),
        email = escape(&user.email),
        photo = escape_attribute(&user.photo),
    );
    layout("Your account", Some(user), &content)
}

pub fn error_page(title: &str, message: &str) -> String {
    let content = format!(
        r#"<div class="error"><div class="error__title"><h2 class="heading-secondary heading-secondary--error">{title}</h2></div><div class="error__msg">{message}</div></div>"#,
        title = escape(title),
        message = escape(message),
    );
    layout(title, None, &content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_page_escapes_the_message() {
        let page = error_page("Something went wrong!", "<script>x</script>");
        assert!(page.contains("&lt;script&gt;x&lt;"));
        assert!(!page.contains("<script>"));
        assert!(page.contains("<title>Natours | Something went wrong!</title>"));
    }

    #[test]
    fn login_page_offers_login_when_anonymous() {
        let page = login(None);
        assert!(page.contains(r#"href="/login">Log in</a>"#));
    }
}
